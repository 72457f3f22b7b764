//! Error types for the scoring core

use thiserror::Error;

/// Errors raised by the encoder, the scoring pipeline and its collaborators
#[derive(Error, Debug)]
pub enum ScoringError {
    /// Caller supplied a payload or row that does not match the schema
    #[error("{0}")]
    Validation(String),

    /// The scoring model or attribution engine failed on a batch
    #[error("Model error: {0}")]
    Model(String),

    /// A component was used before it was fit or loaded
    #[error("{0} used before being fit")]
    NotFitted(&'static str),

    /// `fit` called on an encoder that already holds a mapping
    #[error("Encoder is already fitted and cannot be refit")]
    AlreadyFitted,

    /// A persisted artifact is structurally invalid
    #[error("Invalid artifact: {0}")]
    Artifact(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScoringError {
    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, ScoringError::Validation(_))
    }

    /// Classify a failure to read a JSON artifact: well-formed JSON with
    /// invalid content is an artifact error, anything else stays a
    /// serialization error
    pub(crate) fn from_artifact_json(err: serde_json::Error) -> Self {
        if err.is_data() {
            ScoringError::Artifact(err.to_string())
        } else {
            ScoringError::Serialization(err)
        }
    }
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(ScoringError::Validation("bad row".into()).is_client_error());
        assert!(!ScoringError::Model("boom".into()).is_client_error());
        assert!(!ScoringError::NotFitted("CategoricalEncoder").is_client_error());
    }

    #[test]
    fn test_messages_surface_intact() {
        let err = ScoringError::Model("explainer crashed".into());
        assert_eq!(err.to_string(), "Model error: explainer crashed");

        let err = ScoringError::NotFitted("CategoricalEncoder");
        assert_eq!(err.to_string(), "CategoricalEncoder used before being fit");
    }
}
