use reqwest::{
    StatusCode,
    header::{InvalidHeaderName, InvalidHeaderValue},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("HTTP client error: {0}")]
    UnprotectedClientGeneralError(#[from] reqwest::Error),
    #[error("HTTP client failed to create header")]
    UnprotectedClientInvalidHeader,
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: StatusCode, url: String },
    #[error("Browser session error: {0}")]
    ProtectedClientGeneralError(#[from] chromiumoxide::error::CdpError),
    #[error("Timed out after {timeout_secs}s waiting for '{selector}' on {url}")]
    RenderTimeout {
        url: String,
        selector: String,
        timeout_secs: u64,
    },
}

impl CrawlerError {
    /// Whether re-running the same fetch could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RenderTimeout { .. } => true,
            Self::UnprotectedClientGeneralError(err) => err.is_timeout() || err.is_connect(),
            Self::UnexpectedStatus { status, .. } => status.is_server_error(),
            Self::UnprotectedClientInvalidHeader | Self::ProtectedClientGeneralError(_) => false,
        }
    }
}

impl From<InvalidHeaderName> for CrawlerError {
    fn from(_err: InvalidHeaderName) -> Self {
        Self::UnprotectedClientInvalidHeader
    }
}

impl From<InvalidHeaderValue> for CrawlerError {
    fn from(_err: InvalidHeaderValue) -> Self {
        Self::UnprotectedClientInvalidHeader
    }
}
