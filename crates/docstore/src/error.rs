use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no document at {0}")]
    NotFound(String),

    /// Permission denied or rate limited. Never retried.
    #[error("access denied or rate limited: {0}")]
    Forbidden(String),

    /// The version token did not match, or a create hit an existing document.
    #[error("version conflict on {0}")]
    Conflict(String),

    #[error("remote store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed content encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl StoreError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, StoreError::Forbidden(_))
    }
}
