//! Infrastructure errors for the agent crate
//!
//! Domain outcomes (an unresolvable query, missing market data, an
//! unparseable model reply) are not errors here. They are values carried in
//! [`AnalysisResult`](crate::AnalysisResult). This enum only covers faults
//! that stop a component from being built or a sink from being written.

use thiserror::Error;

/// Errors raised while constructing or running agent infrastructure
#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Environment variable failed to parse
    #[error(transparent)]
    EnvError(#[from] nasdaq_utils::EnvError),

    /// LLM client could not be created
    #[error("LLM error: {0}")]
    LlmError(#[from] nasdaq_llm::LLMError),

    /// Prompt template failed to compile or render
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Audit log I/O failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON encoding failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for agent infrastructure
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::ConfigError("max_turns must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: max_turns must be greater than 0"
        );

        let err: AgentError = nasdaq_utils::EnvError {
            key: "PORT".to_string(),
            value: "abc".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "invalid value for PORT: \"abc\"");
    }
}
