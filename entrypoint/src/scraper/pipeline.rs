use std::sync::Arc;

use common::{
    modes::RunMode,
    store::{ProductStore, StoreError},
};
use crawler::{errors::CrawlerError, traits::PageFetcher};
use extractors::{errors::ExtractorError, structures::Extractor};
use thiserror::Error;
use tracing::info;

use crate::transport::{BatchTransporter, TransportResult};

#[derive(Error, Debug)]
pub(crate) enum ScrapeError {
    #[error("Fetching the listing failed: {0}")]
    Fetch(#[from] CrawlerError),
    #[error("Extracting products failed: {0}")]
    Extract(#[from] ExtractorError),
    #[error("Clearing stored products failed: {0}")]
    Store(#[from] StoreError),
    #[error("Replace mode needs a product store")]
    StoreRequired,
}

impl ScrapeError {
    /// Whether running the scrape again could succeed without changes
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_retryable())
    }
}

#[derive(Debug)]
pub(crate) struct RunSummary {
    pub(crate) extracted: usize,
    pub(crate) cleared: Option<u64>,
    pub(crate) transport: TransportResult,
}

/// Fetch, extract, hand off. One listing page per run.
pub(crate) struct ScrapePipeline {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Box<dyn Extractor>,
    transporter: BatchTransporter,
    store: Option<Arc<dyn ProductStore>>,
}

impl ScrapePipeline {
    pub(crate) fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Box<dyn Extractor>,
        transporter: BatchTransporter,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            transporter,
            store: None,
        }
    }

    /// Only needed for `RunMode::Replace`
    pub(crate) fn with_store(mut self, store: Arc<dyn ProductStore>) -> Self {
        self.store = Some(store);

        self
    }

    pub(crate) async fn run(&self, url: &str, mode: RunMode) -> Result<RunSummary, ScrapeError> {
        let cleared = match mode {
            RunMode::Append => None,
            RunMode::Replace => {
                let Some(store) = &self.store else {
                    return Err(ScrapeError::StoreRequired);
                };

                let removed = store.clear().await?;
                info!("Deleted {removed} existing products");

                Some(removed)
            }
        };

        info!("Scraping {url} with the {} strategy", self.extractor.strategy());

        let page = self.fetcher.fetch_page(url).await?;
        let records = self.extractor.extract(&page).await?;

        for record in records.iter() {
            info!("Prepared: {}", record.name);
        }

        info!("Extracted {} products", records.len());

        let transport = self.transporter.submit(&records).await;

        Ok(RunSummary {
            extracted: records.len(),
            cleared,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use common::record::{Price, ProductRecord};
    use crawler::{
        traits::RawPage,
        unprotected::{FetchOptions, UnprotectedCrawler},
    };
    use extractors::{
        strategies::{EmbeddedDataExtractor, RenderedDomExtractor},
        structures::CardSelectors,
    };
    use importer::memory_store::MemoryStore;
    use tokio::net::TcpListener;

    use super::*;

    const ORIGIN: &str = "https://sandbox.oxylabs.io";

    struct FixedPage(Result<RawPage, fn() -> CrawlerError>);

    #[async_trait]
    impl PageFetcher for FixedPage {
        async fn fetch_page(&self, _url: &str) -> Result<RawPage, CrawlerError> {
            match &self.0 {
                Ok(page) => Ok(page.clone()),
                Err(make_error) => Err(make_error()),
            }
        }
    }

    async fn dead_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        format!("http://{address}/api/import")
    }

    async fn pipeline(fetcher: FixedPage, extractor: Box<dyn Extractor>) -> ScrapePipeline {
        let transporter = BatchTransporter::new(
            UnprotectedCrawler::new(FetchOptions::default()).unwrap(),
            dead_endpoint().await,
        );

        ScrapePipeline::new(Arc::new(fetcher), extractor, transporter)
    }

    fn embedded() -> Box<dyn Extractor> {
        Box::new(EmbeddedDataExtractor::new(&CardSelectors::default(), ORIGIN).unwrap())
    }

    #[tokio::test]
    async fn failed_hand_off_still_completes_the_run() {
        let page = RawPage::from_markup(
            ORIGIN,
            r#"<div class="product-card"><h4 class="title">Widget</h4></div>
               <div class="product-card"><h4 class="title">Gadget</h4></div>"#,
        );

        let summary = pipeline(FixedPage(Ok(page)), embedded())
            .await
            .run(ORIGIN, RunMode::Append)
            .await
            .unwrap();

        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.cleared, None);
        assert!(matches!(summary.transport, TransportResult::Failed(_)));
    }

    #[tokio::test]
    async fn render_timeout_fails_the_run_instead_of_reporting_zero() {
        let fetcher = FixedPage(Err(|| CrawlerError::RenderTimeout {
            url: ORIGIN.into(),
            selector: ".product-card".into(),
            timeout_secs: 30,
        }));
        let extractor = Box::new(
            RenderedDomExtractor::new(&CardSelectors::default(), ORIGIN).unwrap(),
        );

        let result = pipeline(fetcher, extractor)
            .await
            .run(ORIGIN, RunMode::Append)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(CrawlerError::RenderTimeout { .. })));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn replace_mode_clears_the_store_first() {
        let store = Arc::new(MemoryStore::new());
        store
            .apply_record(&ProductRecord::new("Stale", Price::ZERO, ORIGIN))
            .await
            .unwrap();

        let summary = pipeline(FixedPage(Ok(RawPage::from_markup(ORIGIN, ""))), embedded())
            .await
            .with_store(store.clone())
            .run(ORIGIN, RunMode::Replace)
            .await
            .unwrap();

        assert_eq!(summary.cleared, Some(1));
        assert_eq!(summary.extracted, 0);
        assert_eq!(store.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn replace_mode_without_store_is_refused() {
        let result = pipeline(FixedPage(Ok(RawPage::from_markup(ORIGIN, ""))), embedded())
            .await
            .run(ORIGIN, RunMode::Replace)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ScrapeError::StoreRequired));
        assert!(!err.is_retryable());
    }
}
