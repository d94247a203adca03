use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinalyticsError {
    #[error("Invalid argument: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: f64,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinalyticsError {
    fn from(e: serde_json::Error) -> Self {
        FinalyticsError::SerializationError(e.to_string())
    }
}
