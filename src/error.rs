//! Error type shared by the client components.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a client operation.
///
/// Nothing here is fatal: callers log the error and carry on with whatever
/// state they already have.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request failed or its response body could not be read in full.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
    /// The response body did not have the expected shape.
    #[error("unexpected response body from {url}: {message}")]
    Decode { url: String, message: String },
    /// Rejected before any request was sent.
    #[error("{0}")]
    Precondition(String),
    /// Another request of the same kind is still in flight.
    #[error("another request is already in progress")]
    Busy,
    /// The object store refused or failed an operation.
    #[error("object store error: {0}")]
    Storage(String),
}

impl ClientError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn status(url: &str, status: StatusCode) -> Self {
        Self::Status {
            url: url.to_string(),
            status,
        }
    }

    pub(crate) fn decode(url: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// True when the operation was rejected locally and nothing was sent.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_) | Self::Busy)
    }

    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Precondition(message) => message.clone(),
            Self::Busy => "A request is already in progress. Please wait.".to_string(),
            Self::Transport { .. } => "Could not reach the server.".to_string(),
            Self::Status { .. } | Self::Decode { .. } | Self::Storage(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_message_is_shown_verbatim() {
        let err = ClientError::precondition("Select a post first.");
        assert!(err.is_precondition());
        assert_eq!(err.user_message(), "Select a post first.");
    }

    #[test]
    fn test_status_is_not_precondition() {
        let err = ClientError::status("http://x/post/a", StatusCode::NOT_FOUND);
        assert!(!err.is_precondition());
        assert_eq!(err.to_string(), "http://x/post/a returned status 404 Not Found");
    }
}
