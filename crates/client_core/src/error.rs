use shared::error::{failure_reason, ApiErrorBody};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned HTTP {status}: {}", failure_reason(.body.as_ref()))]
    Status {
        path: String,
        status: u16,
        body: Option<ApiErrorBody>,
    },
    #[error("invalid response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    /// Text shown to the user for a non-success response.
    pub fn status_reason(&self) -> Option<&str> {
        match self {
            ClientError::Status { body, .. } => Some(failure_reason(body.as_ref())),
            _ => None,
        }
    }
}
