//! Transaction data structures captured from the check form

use crate::distance::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cardholder gender as offered by the form selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    /// Label shown in the form and written to the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated transaction, built fresh from the form on every submission.
///
/// Only derived fields are persisted; see [`crate::types::LogRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInput {
    /// Merchant name
    pub merchant: String,

    /// Merchant category
    pub category: String,

    /// Transaction amount (non-negative)
    pub amt: f64,

    /// Customer location
    pub customer: Coordinates,

    /// Merchant location
    pub merchant_location: Coordinates,

    /// Hour of day (0-23)
    pub hour: u8,

    /// Day of month (1-31)
    pub day: u8,

    /// Month (1-12)
    pub month: u8,

    /// Cardholder gender
    pub gender: Gender,

    /// Card number as typed
    pub cc_num: String,
}

impl TransactionInput {
    /// Create a transaction with required fields and form defaults elsewhere
    pub fn new(merchant: &str, category: &str, cc_num: &str) -> Self {
        Self {
            merchant: merchant.to_string(),
            category: category.to_string(),
            amt: 0.0,
            customer: Coordinates::new(0.0, 0.0),
            merchant_location: Coordinates::new(0.0, 0.0),
            hour: 12,
            day: 15,
            month: 6,
            gender: Gender::Male,
            cc_num: cc_num.to_string(),
        }
    }
}
