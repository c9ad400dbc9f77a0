//! Single-model inference for fraud verdicts

use crate::feature_extractor::FeatureRow;
use crate::metrics::PipelineMetrics;
use crate::models::loader::LoadedModel;
use crate::types::Verdict;
use anyhow::{anyhow, Context, Result};
use ort::memory::Allocator;
use ort::session::SessionOutputs;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::debug;

/// Probability at or above which the fraud class wins when the model
/// exports probabilities only
const FRAUD_PROBABILITY_CUTOFF: f64 = 0.5;

/// A binary classifier over one feature row
pub trait Classifier: Send + Sync {
    /// Model name for logs and metrics
    fn name(&self) -> &str;

    /// Predict the class label (0 = legitimate, 1 = fraudulent) for one row
    fn predict(&self, features: &[f32]) -> Result<i64>;
}

/// ONNX Runtime backed classifier.
///
/// Sessions need exclusive access to run, so calls are serialized.
pub struct OnnxClassifier {
    name: String,
    model: Mutex<LoadedModel>,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            name: model.name.clone(),
            model: Mutex::new(model),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f32]) -> Result<i64> {
        let mut guard = self
            .model
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let model = &mut *guard;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, features.to_vec())).context("Failed to create input tensor")?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        extract_label(
            &outputs,
            model.label_output.as_deref(),
            model.probability_output.as_deref(),
            &model.name,
        )
    }
}

/// Read the predicted class from model outputs.
///
/// Prefers the exported label; otherwise thresholds the fraud-class
/// probability from a tensor or a seq(map(int64, float)) output.
fn extract_label(
    outputs: &SessionOutputs,
    label_output: Option<&str>,
    probability_output: Option<&str>,
    model_name: &str,
) -> Result<i64> {
    if let Some(output) = label_output.and_then(|name| outputs.get(name)) {
        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            let label = data
                .first()
                .copied()
                .ok_or_else(|| anyhow!("Empty label output"))?;
            debug!(model = %model_name, label, "Extracted label");
            return Ok(label);
        }
    }

    let output = probability_output
        .and_then(|name| outputs.get(name))
        .ok_or_else(|| anyhow!("Model {model_name} produced no usable output"))?;

    let probability = if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        fraud_probability_from_tensor(&dims, data)?
    } else if DynSequenceValueType::can_downcast(&output.dtype()) {
        fraud_probability_from_sequence_map(output)?
    } else {
        return Err(anyhow!("Unsupported probability output type for {model_name}"));
    };

    debug!(model = %model_name, probability, "Extracted fraud probability");
    Ok(i64::from(probability >= FRAUD_PROBABILITY_CUTOFF))
}

/// Fraud probability from a `[batch, classes]`, `[classes]` or `[batch, 1]` tensor
fn fraud_probability_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    match (classes, data) {
        (n, [_, fraud, ..]) if n >= 2 => Ok(*fraud as f64),
        (1, [p, ..]) => Ok(*p as f64),
        _ => Err(anyhow!("Unexpected probability tensor shape {dims:?}")),
    }
}

/// Fraud probability from seq(map(int64, float)), as exported by sklearn zipmap
fn fraud_probability_from_sequence_map(output: &DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let first = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;
    let pairs = first.try_extract_key_values::<i64, f32>()?;

    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(*p as f64);
    }
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - *p as f64);
    }
    Err(anyhow!("No class probability found in map"))
}

/// Runs the classifier on feature rows and maps labels to verdicts
pub struct InferenceEngine {
    classifier: Arc<dyn Classifier>,
    metrics: Arc<PipelineMetrics>,
}

impl InferenceEngine {
    pub fn new(classifier: Arc<dyn Classifier>, metrics: Arc<PipelineMetrics>) -> Self {
        Self { classifier, metrics }
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    /// Predict the verdict for one row. Labels other than 0/1 are errors.
    pub fn predict(&self, row: &FeatureRow) -> Result<Verdict> {
        let features = row.to_vec();
        let start = Instant::now();
        let label = self
            .classifier
            .predict(&features)
            .with_context(|| format!("Model {} failed", self.classifier.name()))?;
        self.metrics
            .record_model_time(self.classifier.name(), start.elapsed());

        Verdict::from_label(label)
    }
}
