//! Error types for Askbase.
//!
//! One enum covers every failure a pipeline run can hit: configuration,
//! the text-generation service, the retrieval service, structured-output
//! parsing of the expansion stage, and prompt rendering.

use thiserror::Error;

/// Unified error type for Askbase.
///
/// Stages never recover locally: errors are propagated unchanged with `?`
/// and the CLI turns them into a message and a non-zero exit code.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required configuration value missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// The text-generation service call failed (network, auth, throttling, model id)
    #[error("Generation service error: {0}")]
    Generation(String),

    /// The retrieval service call failed
    #[error("Retrieval service error: {0}")]
    Retrieval(String),

    /// The expansion stage returned output that is not a flat string map
    #[error("Malformed expansion output: {reason}")]
    MalformedExpansion {
        /// What was wrong with the output
        reason: String,
        /// The seed-prefixed model output that failed to parse
        raw: String,
    },

    /// Prompt template registration or rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a `MalformedExpansion` error.
    pub fn malformed_expansion(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        AppError::MalformedExpansion {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration",
            AppError::Generation(_) => "generation_service",
            AppError::Retrieval(_) => "retrieval_service",
            AppError::MalformedExpansion { .. } => "malformed_expansion_output",
            AppError::Prompt(_) => "prompt",
            AppError::Io(_) => "io",
            AppError::Serialization(_) => "serialization",
            AppError::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_expansion_keeps_raw_output() {
        let err = AppError::malformed_expansion("expected a JSON object", "{not json");
        match &err {
            AppError::MalformedExpansion { reason, raw } => {
                assert_eq!(reason, "expected a JSON object");
                assert_eq!(raw, "{not json");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.kind(), "malformed_expansion_output");
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn test_serde_errors_convert() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(AppError::from(json_err), AppError::Serialization(_)));

        let yaml_err = serde_yaml::from_str::<Vec<u32>>("a: [").unwrap_err();
        assert!(matches!(AppError::from(yaml_err), AppError::Serialization(_)));
    }
}
