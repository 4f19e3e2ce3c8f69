use std::{future::Future, time::Duration};

use async_trait::async_trait;
use chromiumoxide::{Browser, Page, error::CdpError};
use futures::StreamExt;
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{sleep, timeout},
};
use tracing::{debug, info, warn};

use crate::{
    errors::CrawlerError,
    traits::{PageFetcher, RawPage},
};

const RENDER_TIMEOUT_SECONDS: u64 = 30;
const POLL_INTERVAL_MILLIS: u64 = 250;
const BLANK_PAGE: &str = "about:blank";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub wait_selector: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl RenderOptions {
    pub fn new(wait_selector: impl Into<String>) -> Self {
        Self {
            wait_selector: wait_selector.into(),
            timeout: Duration::from_secs(RENDER_TIMEOUT_SECONDS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MILLIS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;

        self
    }
}

/// Drives a remote browser (CDP endpoint) for pages that only have content
/// once client-side rendering has run.
///
/// This crawler is a client of the browser service, it never launches or
/// shuts down the browser itself; it only opens and closes its own tab.
pub struct ProtectedCrawler {
    endpoint: String,
    options: RenderOptions,
}

// chromiumoxide pages have no Drop, a tab left open leaks in the remote browser
struct PageGuard {
    page: Page,
    closed: bool,
    runtime: Handle,
}

impl PageGuard {
    fn new(page: Page) -> Self {
        Self {
            page,
            closed: false,
            runtime: Handle::current(),
        }
    }

    async fn close(mut self) {
        self.closed = true;

        if let Err(err) = self.page.clone().close().await {
            warn!("Failed to close browser tab: {err}");
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        let page = self.page.clone();
        self.runtime.spawn(async move {
            if let Err(err) = page.close().await {
                warn!("Failed to close browser tab during cleanup: {err}");
            }
        });
    }
}

// the CDP handler must be polled for the connection to make progress
struct HandlerGuard(JoinHandle<()>);

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl ProtectedCrawler {
    pub fn new(endpoint: impl Into<String>, options: RenderOptions) -> Self {
        Self {
            endpoint: endpoint.into(),
            options,
        }
    }

    /// Navigates to `url` and blocks until the wait selector shows up in the
    /// DOM or the timeout elapses. The timeout covers navigation, waiting and
    /// reading the DOM, and is an error, never an empty page.
    pub async fn render(&self, url: &str) -> Result<RawPage, CrawlerError> {
        info!("Connecting to browser at {}", self.endpoint);

        let (browser, mut handler) = Browser::connect(self.endpoint.clone()).await?;
        let _handler = HandlerGuard(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        }));

        // the tab is guarded before navigation starts so a stalled load still closes it
        let guard = PageGuard::new(browser.new_page(BLANK_PAGE).await?);
        let content = self
            .within_render_budget(url, self.load_and_read(&guard.page, url))
            .await;
        guard.close().await;

        Ok(RawPage::from_rendered(url, content?))
    }

    async fn load_and_read(&self, page: &Page, url: &str) -> Result<String, CrawlerError> {
        page.goto(url).await?;

        let selector = self.options.wait_selector.as_str();
        poll_until_present(
            || async move { page.find_elements(selector).await.map(|found| !found.is_empty()) },
            self.options.poll_interval,
        )
        .await?;

        debug!("Found '{selector}' on {url}");

        Ok(page.content().await?)
    }

    async fn within_render_budget<T>(
        &self,
        url: &str,
        work: impl Future<Output = Result<T, CrawlerError>>,
    ) -> Result<T, CrawlerError> {
        match timeout(self.options.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(CrawlerError::RenderTimeout {
                url: url.to_string(),
                selector: self.options.wait_selector.clone(),
                timeout_secs: self.options.timeout.as_secs(),
            }),
        }
    }
}

/// Polls until `present` reports a match. An empty match means "not yet",
/// any session error ends the wait at once.
async fn poll_until_present<F, Fut>(mut present: F, interval: Duration) -> Result<(), CrawlerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, CdpError>>,
{
    while !present().await? {
        sleep(interval).await;
    }

    Ok(())
}

#[async_trait]
impl PageFetcher for ProtectedCrawler {
    async fn fetch_page(&self, url: &str) -> Result<RawPage, CrawlerError> {
        self.render(url).await
    }
}
