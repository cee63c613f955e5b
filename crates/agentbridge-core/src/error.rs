use thiserror::Error;

/// Shared error taxonomy (spec §7). Component-local errors convert into
/// this via `#[from]` where a dependency crosses a crate boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Integration connection error ({platform}): {reason}")]
    IntegrationConnection { platform: String, reason: String },

    #[error("Integration transient error ({platform}): {reason}")]
    IntegrationTransient { platform: String, reason: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Rate limited: {reason}")]
    RateLimited { reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short error code used in logs and training-export metadata.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::IntegrationConnection { .. } => "INTEGRATION_CONNECTION_ERROR",
            CoreError::IntegrationTransient { .. } => "INTEGRATION_TRANSIENT_ERROR",
            CoreError::Llm(_) => "LLM_ERROR",
            CoreError::RateLimited { .. } => "RATE_LIMITED",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Persistence(_) => "PERSISTENCE_ERROR",
            CoreError::Encryption(_) => "ENCRYPTION_ERROR",
            CoreError::UnknownTool { .. } => "UNKNOWN_TOOL",
            CoreError::Serialization(_) => "SERIALIZATION_ERROR",
            CoreError::Io(_) => "IO_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this class of failure is worth retrying with backoff
    /// (spec §7: transient integration/LLM failures retry, validation
    /// and config failures do not).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::IntegrationTransient { .. } | CoreError::Llm(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
