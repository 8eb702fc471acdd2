//! Remote call errors.

use thiserror::Error;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors reported by a [`RemoteListService`](super::RemoteListService).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Token missing, expired or rejected (HTTP 401/403).
    #[error("Not authorized. Check the API token in your config.")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server returned status {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection refused, DNS failure, timeout.
    #[error("Connection error: {0}")]
    Network(String),

    #[error("Invalid response from server: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Unauthorized)
    }

    /// Maps a non-success HTTP status to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => RemoteError::Unauthorized,
            404 => RemoteError::NotFound(summarize(body)),
            _ => RemoteError::Http {
                status,
                message: summarize(body),
            },
        }
    }
}

/// Keeps error messages to one readable line.
fn summarize(body: &str) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return "no details".to_string();
    }
    match line.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}
