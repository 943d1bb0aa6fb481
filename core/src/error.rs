//! Unified error types for the cantus-core public API.
//!
//! Task assembly is one-shot: there is no retry or partial recovery, so every
//! fatal condition propagates to the caller as a [`TaskError`]. The only
//! non-fatal condition in the crate is vocoder unavailability, which is
//! reported as `Ok(None)` with a logged warning rather than an error.
//!
//! # Error Hierarchy
//!
//! ```text
//! TaskError
//! ├── Config(String)             -- malformed or missing configuration
//! ├── UnknownChoice { .. }       -- registry lookup on an unregistered label
//! ├── Inconsistent(String)       -- conflicting settings between components
//! ├── UnsupportedFormat(String)  -- unrecognized artifact format
//! ├── Io(std::io::Error)         -- token list / config file reads
//! └── Serialization(String)      -- YAML parsing errors
//! ```

use thiserror::Error;

/// The canonical error type for cantus-core public API.
///
/// All fallible public API methods return `Result<T, TaskError>`.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registry lookup failed: the label is not registered for the slot
    #[error("No such {slot} choice: '{label}' (choose from: {known})")]
    UnknownChoice {
        /// Registry slot name (e.g. "svs", "feats_extract")
        slot: String,
        /// The label that was requested
        label: String,
        /// Comma-separated list of registered labels
        known: String,
    },

    /// Settings of two components contradict each other
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),

    /// An artifact (e.g. vocoder checkpoint) has an unrecognized format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error (YAML)
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for cantus-core.
pub type TaskResult<T> = Result<T, TaskError>;

impl From<serde_yaml::Error> for TaskError {
    fn from(e: serde_yaml::Error) -> Self {
        TaskError::Serialization(e.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Convenience constructors
// ─────────────────────────────────────────────────────────────────────────────

impl TaskError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        TaskError::Config(msg.into())
    }

    /// Create a consistency error.
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        TaskError::Inconsistent(msg.into())
    }

    /// Create an unsupported-format error.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        TaskError::UnsupportedFormat(msg.into())
    }

    /// Create an unknown-choice error for a registry slot.
    pub fn unknown_choice(slot: &str, label: &str, known: &[&str]) -> Self {
        TaskError::UnknownChoice {
            slot: slot.to_string(),
            label: label.to_string(),
            known: known.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display() {
        let err = TaskError::config("token_list must be set");
        assert_eq!(
            err.to_string(),
            "Configuration error: token_list must be set"
        );
    }

    #[test]
    fn test_unknown_choice_display() {
        let err = TaskError::unknown_choice("svs", "wavenet", &["naive_rnn", "xiaoice"]);
        assert_eq!(
            err.to_string(),
            "No such svs choice: 'wavenet' (choose from: naive_rnn, xiaoice)"
        );
    }

    #[test]
    fn test_yaml_error_conversion() {
        let result: Result<serde_yaml::Value, _> = serde_yaml::from_str(": not yaml: [");
        let err: TaskError = result.unwrap_err().into();
        assert!(matches!(err, TaskError::Serialization(_)));
    }
}
