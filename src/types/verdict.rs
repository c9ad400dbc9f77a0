//! Binary fraud verdict

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model verdict for one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Legitimate Transaction")]
    Legitimate,
    #[serde(rename = "Fraudulent Transaction")]
    Fraudulent,
}

impl Verdict {
    /// Map a raw class label (0 = legitimate, 1 = fraudulent) to a verdict.
    ///
    /// Any other label is rejected.
    pub fn from_label(label: i64) -> Result<Self> {
        match label {
            0 => Ok(Verdict::Legitimate),
            1 => Ok(Verdict::Fraudulent),
            other => bail!("Model returned unexpected class label {other}"),
        }
    }

    /// Human label displayed and logged
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Legitimate => "Legitimate Transaction",
            Verdict::Fraudulent => "Fraudulent Transaction",
        }
    }

    pub fn is_fraud(&self) -> bool {
        matches!(self, Verdict::Fraudulent)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
