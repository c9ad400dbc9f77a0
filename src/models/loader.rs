//! Artifact loader: ONNX classifier and categorical encoder map

use crate::config::ArtifactsConfig;
use crate::models::encoder::EncoderMap;
use crate::models::inference::{Classifier, OnnxClassifier};
use anyhow::{bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the feature row
    pub input_name: String,
    /// Output carrying the predicted class label, if the model exports one
    pub label_output: Option<String>,
    /// Output carrying class probabilities, if the model exports one
    pub probability_output: Option<String>,
}

/// Everything the service needs from disk before it can answer a request
pub struct Artifacts {
    pub classifier: Arc<dyn Classifier>,
    pub encoders: EncoderMap,
}

/// Loader for the model and encoder artifacts
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a new loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load both artifacts. Either one missing or corrupt is an error.
    pub fn load(config: &ArtifactsConfig) -> Result<Artifacts> {
        let loader = Self::with_threads(config.onnx_threads);

        let encoders = loader.load_encoders(&config.encoder_path)?;
        let classifier = loader.load_model(&config.model_path)?;

        Ok(Artifacts {
            classifier: Arc::new(classifier),
            encoders,
        })
    }

    /// Load the categorical encoder map
    pub fn load_encoders<P: AsRef<Path>>(&self, path: P) -> Result<EncoderMap> {
        let path = path.as_ref();
        let encoders = EncoderMap::load(path)?;

        for column in encoders.columns() {
            let classes = encoders.get(column).map(|e| e.class_count()).unwrap_or(0);
            info!(column = %column, classes, "Encoder loaded");
        }

        Ok(encoders)
    }

    /// Load the ONNX classification model
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<OnnxClassifier> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("Model file not found: {}", path.display());
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        if label_output.is_none() && probability_output.is_none() {
            bail!(
                "Model {} exports neither a label nor a probability output",
                path.display()
            );
        }

        info!(
            model = %name,
            input = %input_name,
            label_output = ?label_output,
            probability_output = ?probability_output,
            "Model loaded successfully"
        );

        Ok(OnnxClassifier::new(LoadedModel {
            name,
            session,
            input_name,
            label_output,
            probability_output,
        }))
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactLoader::new()
            .load_model(dir.path().join("fraud_detection_model.onnx"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Model file not found"));
    }

    #[test]
    fn test_missing_encoder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArtifactsConfig {
            model_path: dir.path().join("model.onnx").display().to_string(),
            encoder_path: dir.path().join("label_encoder.json").display().to_string(),
            onnx_threads: 1,
        };
        assert!(ArtifactLoader::load(&config).is_err());
    }

    #[test]
    fn test_thread_count_floor() {
        assert_eq!(ArtifactLoader::with_threads(0).onnx_threads, 1);
    }
}
