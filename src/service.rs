//! One fraud check per submission.
//!
//! Each call is a self-contained transaction against the loaded artifacts and
//! the prediction log; no session state is kept between calls.

use crate::distance::geodesic_km;
use crate::feature_extractor::{FeatureExtractor, FeatureRow};
use crate::form::{FormError, SubmissionForm};
use crate::history::PredictionLog;
use crate::metrics::PipelineMetrics;
use crate::models::{Artifacts, Classifier, EncoderMap, InferenceEngine};
use crate::types::{LogRecord, Verdict};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Why a submission produced no verdict
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error("Inference failed: {0:#}")]
    Inference(anyhow::Error),
    #[error("Failed to record prediction: {0:#}")]
    Log(anyhow::Error),
}

/// Outcome of a successful check
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub verdict: Verdict,
    pub distance_km: f64,
    /// Categorical columns encoded with the sentinel
    pub unseen_columns: Vec<&'static str>,
    pub features: FeatureRow,
    pub record: LogRecord,
}

/// Fraud check service: validation, features, inference and logging
pub struct FraudService {
    extractor: FeatureExtractor,
    engine: InferenceEngine,
    log: PredictionLog,
    metrics: Arc<PipelineMetrics>,
}

impl FraudService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        encoders: EncoderMap,
        log: PredictionLog,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            extractor: FeatureExtractor::new(encoders),
            engine: InferenceEngine::new(classifier, metrics.clone()),
            log,
            metrics,
        }
    }

    /// Build from loaded artifacts
    pub fn from_artifacts(artifacts: Artifacts, log: PredictionLog, metrics: Arc<PipelineMetrics>) -> Self {
        Self::new(artifacts.classifier, artifacts.encoders, log, metrics)
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn log(&self) -> &PredictionLog {
        &self.log
    }

    pub fn model_name(&self) -> &str {
        self.engine.model_name()
    }

    /// Check one submission and append it to the log.
    ///
    /// Validation failures return before any inference or logging.
    pub fn submit(&self, form: &SubmissionForm) -> Result<Submission, SubmissionError> {
        let start = Instant::now();

        let input = form.validate().map_err(|e| {
            self.metrics.record_rejection();
            debug!(error = %e, "Submission rejected");
            e
        })?;

        let distance_km = geodesic_km(input.customer, input.merchant_location);
        let features = self.extractor.extract(&input, distance_km);
        self.metrics.record_unseen(&features.unseen);

        let verdict = self.engine.predict(&features.row).map_err(|e| {
            error!(error = %e, "Inference failed");
            SubmissionError::Inference(e)
        })?;

        let record = LogRecord::now(&input, distance_km, verdict);
        self.log.append(&record).map_err(|e| {
            error!(error = %e, path = %self.log.path().display(), "Failed to append prediction");
            SubmissionError::Log(e)
        })?;

        let elapsed = start.elapsed();
        self.metrics.record_submission(elapsed, verdict);

        info!(
            merchant = %input.merchant,
            category = %input.category,
            amt = input.amt,
            distance_km = format!("{:.3}", distance_km),
            verdict = %verdict,
            unseen = ?features.unseen,
            processing_time_us = elapsed.as_micros(),
            "Transaction checked"
        );

        Ok(Submission {
            verdict,
            distance_km,
            unseen_columns: features.unseen,
            features: features.row,
            record,
        })
    }

    /// All logged predictions, most recent first; `None` before the first one.
    pub fn history(&self) -> anyhow::Result<Option<Vec<LogRecord>>> {
        self.log.load()
    }
}
