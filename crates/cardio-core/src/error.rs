use crate::schema::ModelKind;

/// Request-scoped failures. None of them affect process state.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Model not found: {0}")]
    UnknownModel(String),

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(ModelKind),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Random Forest model not loaded")]
    InsightsUnavailable,
}
