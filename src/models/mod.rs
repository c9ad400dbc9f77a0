//! Pre-trained artifacts: classification model and categorical encoders

pub mod encoder;
pub mod inference;
pub mod loader;

pub use encoder::{EncodeError, EncoderMap, LabelEncoder};
pub use inference::{Classifier, InferenceEngine, OnnxClassifier};
pub use loader::{ArtifactLoader, Artifacts};
