use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("matrix request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("matrix homeserver returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("event could not be decrypted")]
    Undecryptable,
}
