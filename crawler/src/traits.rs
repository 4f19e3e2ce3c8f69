use async_trait::async_trait;
pub use reqwest::StatusCode;

use crate::errors::CrawlerError;

#[derive(Debug, Clone, Copy)]
pub enum HttpMethod {
    GET,
    POST,
}

pub struct CrawlerResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Markup of a single page as handed to an extraction strategy.
///
/// `rendered` is set when the markup was read from a hydrated browser DOM
/// instead of the raw server response. Browser resources are already released
/// by the time a `RawPage` exists, so it is safe to hold across awaits.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub body: String,
    pub rendered: bool,
}

impl RawPage {
    pub fn from_markup(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            rendered: false,
        }
    }

    pub fn from_rendered(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            rendered: true,
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<RawPage, CrawlerError>;
}
