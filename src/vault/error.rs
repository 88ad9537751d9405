use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    /// The request could not be sent or the response body could not be read
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST API answered with an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid path
    #[error("Invalid path: {reason}")]
    InvalidPath { reason: String },

    /// Unexpected response body
    #[error("failed to decode response: {reason}")]
    Decode { reason: String },
}

impl VaultError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        VaultError::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_path(reason: impl Into<String>) -> Self {
        VaultError::InvalidPath {
            reason: reason.into(),
        }
    }

    pub fn invalid_path_traversal(path: &str) -> Self {
        VaultError::InvalidPath {
            reason: format!("path traversal detected: {:?}", path),
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        VaultError::Decode {
            reason: reason.into(),
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            VaultError::Api { status, .. } => Some(*status),
            VaultError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}
