//! Classifier Module - classifier loading and inference
//!
//! The service only talks to the [`Classifier`] trait. The on-disk format
//! lives in [`artifact`] so another backend can be swapped in without
//! touching the prediction path.

pub mod artifact;

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

pub use artifact::LoadedModel;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// A fitted classifier that predicts one class for one feature row
pub trait Classifier: Send + Sync {
    /// Feature order the model was trained with, when it was recorded
    fn feature_names(&self) -> Option<&[String]>;

    /// Predict the class of a single row. The class is returned exactly as
    /// the model stores it; callers normalize it.
    fn predict(&self, row: &[f64]) -> Result<Value, ModelError>;

    /// Short human readable description for logs and health checks
    fn describe(&self) -> String;
}

/// Load a classifier from a JSON model artifact
pub fn load_model(path: impl AsRef<Path>) -> Result<Arc<dyn Classifier>, ModelError> {
    let path = path.as_ref();
    tracing::info!("Loading model from: {}", path.display());

    let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let model = LoadedModel::from_json(&raw)?;
    tracing::info!("Model loaded from {}: {}", path.display(), model.describe());

    Ok(Arc::new(model))
}
