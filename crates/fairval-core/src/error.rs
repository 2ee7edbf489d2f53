use thiserror::Error;

#[derive(Debug, Error)]
pub enum FairvalError {
    #[error("Invalid assumption: {field} — {reason}")]
    InvalidAssumption { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Degenerate division in {context}")]
    DivisionDegenerate { context: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FairvalError {
    fn from(e: serde_json::Error) -> Self {
        FairvalError::Serialization(e.to_string())
    }
}
