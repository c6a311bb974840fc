//! Engine error types

use thiserror::Error;

/// Errors that can occur inside the admission-control engine
///
/// Note that most "failures" in the engine are not errors at all: a missing
/// branch, an unreadable transcript or an absent external tool are represented
/// as absent snapshot values and resolved through each rule's declared failure
/// policy. `EngineError` covers the genuinely unexpected paths.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input record could not be turned into an `ActionRequest`
    #[error("Normalization failed: {0}")]
    Normalization(String),

    /// A rule hit an internal error while evaluating
    #[error("Rule '{rule}' failed internally: {message}")]
    RuleInternal { rule: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration (bad glob, bad regex, empty chain entry)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        EngineError::Other(msg.into())
    }

    /// Create an internal rule error
    pub fn rule_internal(rule: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::RuleInternal {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Normalization("no kind field".into());
        assert_eq!(err.to_string(), "Normalization failed: no kind field");

        let err = EngineError::rule_internal("branch-naming", "regex blew up");
        assert_eq!(
            err.to_string(),
            "Rule 'branch-naming' failed internally: regex blew up"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let engine_err: EngineError = io_err.into();
        assert!(matches!(engine_err, EngineError::Io(_)));
    }
}
