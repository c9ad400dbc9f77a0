//! Feature extraction for fraud model inference.
//!
//! Builds the single nine-column row the classifier was trained on.
//! Categorical columns are label-encoded and values unseen at training time
//! become [`UNSEEN_SENTINEL`]. The card number is reduced to a two-digit
//! pseudo-identifier with a stable hash.

use crate::models::encoder::EncoderMap;
use crate::types::TransactionInput;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

/// Model input columns, in the order the model expects them
pub const FEATURE_COLUMNS: [&str; 9] = [
    "merchant", "category", "amt", "distance", "hour", "day", "month", "gender", "cc_num",
];

/// Columns replaced by encoder codes
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["merchant", "category", "gender"];

/// Code for a categorical value the encoder has never seen
pub const UNSEEN_SENTINEL: i64 = -1;

/// Card numbers are bucketed into this many codes
pub const CARD_CODE_BUCKETS: u64 = 100;

/// One encoded model input row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub merchant: i64,
    pub category: i64,
    pub amt: f64,
    pub distance: f64,
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub gender: i64,
    pub cc_num: u8,
}

impl FeatureRow {
    /// Model input vector in [`FEATURE_COLUMNS`] order
    pub fn to_vec(&self) -> Vec<f32> {
        vec![
            self.merchant as f32,
            self.category as f32,
            self.amt as f32,
            self.distance as f32,
            self.hour as f32,
            self.day as f32,
            self.month as f32,
            self.gender as f32,
            self.cc_num as f32,
        ]
    }
}

/// Extraction output: the row plus the categorical columns that fell back
/// to the sentinel
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFeatures {
    pub row: FeatureRow,
    pub unseen: Vec<&'static str>,
}

/// Transforms transactions into model input rows.
pub struct FeatureExtractor {
    encoders: EncoderMap,
}

impl FeatureExtractor {
    /// Create a new feature extractor over fitted encoders.
    pub fn new(encoders: EncoderMap) -> Self {
        Self { encoders }
    }

    /// Extract the feature row for a transaction and its precomputed distance.
    pub fn extract(&self, tx: &TransactionInput, distance_km: f64) -> ExtractedFeatures {
        let mut unseen = Vec::new();
        let [merchant_col, category_col, gender_col] = CATEGORICAL_COLUMNS;

        let merchant = self.encode(merchant_col, &tx.merchant, &mut unseen);
        let category = self.encode(category_col, &tx.category, &mut unseen);
        let gender = self.encode(gender_col, tx.gender.as_str(), &mut unseen);

        let row = FeatureRow {
            merchant,
            category,
            amt: tx.amt,
            distance: distance_km,
            hour: tx.hour,
            day: tx.day,
            month: tx.month,
            gender,
            cc_num: card_number_code(&tx.cc_num),
        };

        if !unseen.is_empty() {
            warn!(columns = ?unseen, "Categorical values unseen by encoder, using sentinel");
        }

        ExtractedFeatures { row, unseen }
    }

    fn encode(&self, column: &'static str, value: &str, unseen: &mut Vec<&'static str>) -> i64 {
        match self.encoders.transform(column, value) {
            Ok(code) => code,
            Err(_) => {
                unseen.push(column);
                UNSEEN_SENTINEL
            }
        }
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COLUMNS.len()
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }
}

/// Two-digit pseudo-identifier for a card number.
///
/// First eight bytes of SHA-256 (big-endian) modulo 100; identical for the
/// same input across runs and hosts. Not a privacy measure.
pub fn card_number_code(cc_num: &str) -> u8 {
    let digest = Sha256::digest(cc_num.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % CARD_CODE_BUCKETS) as u8
}
