//! Shared fixtures: a rule-based stand-in for the ONNX model and a small
//! encoder map.

#![allow(dead_code)]

use anyhow::Result;
use fraud_check::history::PredictionLog;
use fraud_check::metrics::PipelineMetrics;
use fraud_check::models::EncoderMap;
use fraud_check::{Classifier, FraudService, SubmissionForm};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const ENCODER_JSON: &str = r#"{
    "merchant": ["Acme", "Corner Store", "ShopCo"],
    "category": ["gas_transport", "grocery", "shopping_net"],
    "gender": ["Female", "Male"]
}"#;

/// Flags anything above `limit` and remembers every row it saw
pub struct AmountRule {
    pub limit: f32,
    pub seen: Mutex<Vec<Vec<f32>>>,
}

impl AmountRule {
    pub fn new(limit: f32) -> Self {
        Self {
            limit,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Classifier for AmountRule {
    fn name(&self) -> &str {
        "amount_rule"
    }

    fn predict(&self, features: &[f32]) -> Result<i64> {
        self.seen.lock().unwrap().push(features.to_vec());
        Ok(i64::from(features[2] > self.limit))
    }
}

/// Always answers with the same raw label
pub struct ConstantLabel(pub i64);

impl Classifier for ConstantLabel {
    fn name(&self) -> &str {
        "constant"
    }

    fn predict(&self, _features: &[f32]) -> Result<i64> {
        Ok(self.0)
    }
}

pub fn service_with(classifier: Arc<dyn Classifier>, log_path: &Path) -> FraudService {
    FraudService::new(
        classifier,
        EncoderMap::from_json(ENCODER_JSON).unwrap(),
        PredictionLog::new(log_path),
        Arc::new(PipelineMetrics::new()),
    )
}

pub fn shopco_form() -> SubmissionForm {
    serde_json::from_value(serde_json::json!({
        "merchant": "ShopCo",
        "category": "grocery",
        "amt": 42.50,
        "lat": 40.0,
        "long": -75.0,
        "merch_lat": 40.1,
        "merch_long": -75.1,
        "hour": 14,
        "day": 5,
        "month": 3,
        "gender": "Female",
        "cc_num": "4111111111111111"
    }))
    .unwrap()
}
