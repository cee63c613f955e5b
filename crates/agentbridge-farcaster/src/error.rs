use thiserror::Error;

#[derive(Debug, Error)]
pub enum FarcasterError {
    #[error("farcaster request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("farcaster hub returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("no API key configured")]
    MissingApiKey,
}
