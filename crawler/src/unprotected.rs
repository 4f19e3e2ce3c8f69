use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, ClientBuilder,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use tracing::{debug, info};

use crate::{
    errors::CrawlerError,
    request::{Request, RequestBuilder},
    traits::{CrawlerResponse, HttpMethod, PageFetcher, RawPage},
};

const PAGE_TIMEOUT_SECONDS: u64 = 20;

const USER_AGENT: &str = "catalog-ingest/1.0 (+product listing scraper)";

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// The sandbox target serves self-signed certificates
    pub accept_invalid_certs: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(PAGE_TIMEOUT_SECONDS),
            accept_invalid_certs: true,
        }
    }
}

/// Plain HTTP client, no browser involved.
///
/// Requests are never retried here: a failed fetch aborts the scrape run and a
/// failed hand-off is reported to the operator, who re-runs the scrape.
#[derive(Clone)]
pub struct UnprotectedCrawler {
    client: Client,
}

impl UnprotectedCrawler {
    pub fn new(options: FetchOptions) -> Result<Self, CrawlerError> {
        let client = ClientBuilder::new()
            .gzip(true)
            .http1_ignore_invalid_headers_in_responses(true)
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }

    /// Sends the request and hands back the response whatever its status.
    /// Callers decide what a non-2xx status means to them.
    pub async fn make_web_request(
        &self,
        request: Request,
    ) -> Result<CrawlerResponse, CrawlerError> {
        let mut request_builder = match request.method {
            HttpMethod::GET => self.client.get(&request.url),
            HttpMethod::POST => self.client.post(&request.url),
        };

        if let Some(json) = request.json {
            request_builder = request_builder.json(&json);
        }

        if !request.headers.is_empty() {
            let mut header_map = HeaderMap::new();

            for (key, value) in request.headers.iter() {
                header_map.append(HeaderName::from_str(key)?, HeaderValue::from_str(value)?);
            }

            request_builder = request_builder.headers(header_map);
        }

        info!("Sending {:?} request to {}", request.method, request.url);

        let response = request_builder.send().await?;

        debug!("{response:?}");

        let status = response.status();
        let body = response.text().await?;

        Ok(CrawlerResponse { status, body })
    }
}

#[async_trait]
impl PageFetcher for UnprotectedCrawler {
    async fn fetch_page(&self, url: &str) -> Result<RawPage, CrawlerError> {
        let request = RequestBuilder::new().set_url(url).build();
        let response = self.make_web_request(request).await?;

        if !response.status.is_success() {
            return Err(CrawlerError::UnexpectedStatus {
                status: response.status,
                url: url.to_string(),
            });
        }

        Ok(RawPage::from_markup(url, response.body))
    }
}
