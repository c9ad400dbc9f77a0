//! Fraud Check Library
//!
//! Collects transaction attributes from a web form, derives the
//! customer-merchant geodesic distance, asks a pre-trained classifier for a
//! fraud verdict and keeps an append-only history of every check.

pub mod config;
pub mod distance;
pub mod feature_extractor;
pub mod form;
pub mod history;
pub mod metrics;
pub mod models;
pub mod service;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use feature_extractor::FeatureExtractor;
pub use form::SubmissionForm;
pub use history::PredictionLog;
pub use models::inference::{Classifier, InferenceEngine};
pub use service::{FraudService, Submission, SubmissionError};
pub use types::{LogRecord, TransactionInput, Verdict};
