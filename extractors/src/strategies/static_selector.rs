use std::sync::Arc;

use async_trait::async_trait;
use common::{modes::Strategy, record::ProductRecord};
use crawler::traits::{PageFetcher, RawPage};
use futures::{StreamExt, stream};
use tracing::{debug, warn};

use crate::{
    errors::ExtractorError,
    normalizer::{flatten_categories, resolve_image_url},
    strategies::cards::{CardFields, CardParser},
    structures::{CardSelectors, Extractor},
};

const DEFAULT_DETAIL_CONCURRENCY: usize = 4;

/// Server-rendered HTML read through CSS selectors.
///
/// Listing cards carry no usable image, so each card's detail page is fetched
/// and its image element read. Detail fetches fan out with bounded
/// concurrency; output order still follows the cards.
pub struct StaticSelectorExtractor {
    parser: CardParser,
    origin: String,
    fetcher: Arc<dyn PageFetcher>,
    detail_concurrency: usize,
}

impl StaticSelectorExtractor {
    pub fn new(
        selectors: &CardSelectors,
        origin: impl Into<String>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, ExtractorError> {
        Ok(Self {
            parser: CardParser::new(selectors)?,
            origin: origin.into(),
            fetcher,
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
        })
    }

    pub fn with_detail_concurrency(mut self, concurrency: usize) -> Self {
        self.detail_concurrency = concurrency.max(1);

        self
    }

    async fn build_record(&self, card: CardFields) -> ProductRecord {
        let image_url = match card.detail_path {
            Some(_) => self.detail_image(&card.source_url(&self.origin)).await,
            None => None,
        };

        let category = flatten_categories(&card.category_labels);

        card.into_record(&self.origin, category, image_url)
    }

    async fn detail_image(&self, detail_url: &str) -> Option<String> {
        let page = match self.fetcher.fetch_page(detail_url).await {
            Ok(page) => page,
            Err(err) => {
                warn!("Failed to fetch detail page {detail_url}, leaving image empty: {err}");
                return None;
            }
        };

        let image = self.parser.parse_detail_image(&page.body);
        debug!("Detail page {detail_url} has image {image:?}");

        resolve_image_url(&self.origin, image.as_deref())
    }
}

#[async_trait]
impl Extractor for StaticSelectorExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::StaticSelector
    }

    async fn extract(&self, page: &RawPage) -> Result<Vec<ProductRecord>, ExtractorError> {
        let cards = self.parser.parse_cards(&page.body);

        debug!("Found {} titled cards on {}", cards.len(), page.url);

        let records = stream::iter(cards)
            .map(|card| self.build_record(card))
            .buffered(self.detail_concurrency)
            .collect::<Vec<ProductRecord>>()
            .await;

        Ok(records)
    }
}
