use thiserror::Error;

/// Failures talking to the companion service.
///
/// The `Display` text is what the user sees after the network-error prefix,
/// so keep it short and readable.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API URL '{0}'")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            "no response body".to_string()
        } else {
            body
        };
        ApiError::Status { status, body }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
