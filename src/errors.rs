use std::sync::Arc;

/// Every failure surfaced by the client. `Clone` so a single refresh outcome
/// can be handed to all callers waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Network error ({status}): {}", .message.as_deref().unwrap_or("-"))]
    Network {
        status: u16,
        message: Option<String>,
    },
    #[error("Decoding error: {0}")]
    Decoding(String),
    #[error("Server error: {}", .message.as_deref().unwrap_or("-"))]
    Server { message: Option<String> },
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("Cancelled")]
    Cancelled,
    #[error("Transport error: {0}")]
    Transport(Arc<reqwest::Error>),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),
    #[error("Token refresh aborted: {0}")]
    RefreshAborted(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized => Some(401),
            Error::Network { status, .. } => Some(*status),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decoding(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Arc::new(err))
    }
}
