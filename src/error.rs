//! Errors raised while talking to the learning platform.

/// Failure of a feed or roster request.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection, TLS, or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected JSON shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local roster file failed validation before upload.
    #[error("invalid roster CSV: {0}")]
    InvalidCsv(String),

    /// Server refused the roster upload; carries the server's error text.
    #[error("roster upload rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, BoardError>;
