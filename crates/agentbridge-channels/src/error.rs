use thiserror::Error;

/// Errors that can occur within any integration adapter.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Returned by the default implementation of an optional capability
    /// (room management, reactions, media, profile lookup, search,
    /// notifications, key requests) that a given integration doesn't offer.
    #[error("operation not supported by this integration")]
    NotSupported,
}
