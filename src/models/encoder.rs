//! Categorical label encoders fixed at training time.
//!
//! The encoder artifact is a JSON object mapping each categorical column to
//! its ordered list of classes; a value's code is its index in that list:
//!
//! ```json
//! { "merchant": ["fraud_Abbott", "fraud_Bahringer"], "category": ["grocery_pos"], "gender": ["F", "M"] }
//! ```

use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

use crate::feature_extractor::CATEGORICAL_COLUMNS;

/// Encoding failure for a single value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("value {value:?} was not seen when the {column} encoder was fitted")]
    Unseen { column: String, value: String },
    #[error("no encoder for column {0}")]
    MissingColumn(String),
}

/// String to integer encoder for one column
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Create an encoder from classes in code order.
    pub fn new(classes: Vec<String>) -> Result<Self> {
        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code as i64).is_some() {
                bail!("duplicate class {class:?}");
            }
        }
        Ok(Self { classes, codes })
    }

    /// Code for a known value
    pub fn transform(&self, value: &str) -> Option<i64> {
        self.codes.get(value).copied()
    }

    /// Number of classes the encoder was fitted on
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

/// Per-column encoders for the categorical model inputs
#[derive(Debug, Clone)]
pub struct EncoderMap {
    encoders: HashMap<String, LabelEncoder>,
}

impl EncoderMap {
    /// Build from column -> classes. Every categorical model column must be present.
    pub fn from_classes(columns: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut encoders = HashMap::with_capacity(columns.len());
        for (column, classes) in columns {
            let encoder =
                LabelEncoder::new(classes).with_context(|| format!("Invalid encoder for {column}"))?;
            encoders.insert(column, encoder);
        }

        for column in CATEGORICAL_COLUMNS {
            if !encoders.contains_key(column) {
                bail!("Encoder map has no entry for column {column:?}");
            }
        }

        Ok(Self { encoders })
    }

    /// Parse the JSON encoder artifact
    pub fn from_json(json: &str) -> Result<Self> {
        let columns: BTreeMap<String, Vec<String>> =
            serde_json::from_str(json).context("Encoder artifact is not a column -> classes map")?;
        Self::from_classes(columns)
    }

    /// Load the JSON encoder artifact from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read encoder from {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to load encoder from {}", path.display()))
    }

    /// Encode `value` for `column`, failing on values unseen at fit time.
    pub fn transform(&self, column: &str, value: &str) -> Result<i64, EncodeError> {
        let encoder = self
            .encoders
            .get(column)
            .ok_or_else(|| EncodeError::MissingColumn(column.to_string()))?;

        encoder.transform(value).ok_or_else(|| EncodeError::Unseen {
            column: column.to_string(),
            value: value.to_string(),
        })
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }
}
