//! Error types for the tabq crate

use thiserror::Error;

/// Main error type for the tabq crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error(
        "stored table has shape {stored_states}x{stored_actions}, configuration expects {expected_states}x{expected_actions}"
    )]
    ShapeMismatch {
        stored_states: usize,
        stored_actions: usize,
        expected_states: usize,
        expected_actions: usize,
    },

    #[error("no reward configured for action '{action}' with outcome '{outcome}'")]
    MissingReward { action: String, outcome: String },

    #[error("expected {expected} feature readings, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("state {state} is out of range (state count is {state_count})")]
    StateOutOfRange { state: usize, state_count: usize },

    #[error("action {action} is out of range (action count is {action_count})")]
    ActionOutOfRange { action: usize, action_count: usize },

    #[error("update of Q[{state}][{action}] produced non-finite value {value}")]
    NonFiniteValue {
        state: usize,
        action: usize,
        value: f64,
    },

    #[error("external reward {reward} is not finite")]
    NonFiniteReward { reward: f64 },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("stored table is corrupt: {reason}")]
    CorruptTable { reason: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    /// Fatal misconfiguration that must surface at startup.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfiguration { .. }
                | Error::ShapeMismatch { .. }
                | Error::MissingReward { .. }
        )
    }

    /// Storage failure that the caller may recover from with an in-memory table.
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            Error::Io { .. } | Error::SerializationContext { .. } | Error::CorruptTable { .. }
        )
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_is_config_error() {
        let err = Error::ShapeMismatch {
            stored_states: 4,
            stored_actions: 3,
            expected_states: 8,
            expected_actions: 6,
        };
        assert!(err.is_config_error());
        assert!(!err.is_persistence_error());
        assert!(err.to_string().contains("4x3"));
    }

    #[test]
    fn test_io_is_persistence_error() {
        let err = Error::from(std::io::Error::other("disk full"));
        assert!(err.is_persistence_error());
        assert!(!err.is_config_error());
    }
}
