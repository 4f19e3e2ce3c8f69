use async_trait::async_trait;
use common::{modes::Strategy, record::ProductRecord};
use crawler::traits::RawPage;

use crate::errors::ExtractorError;

/// One way of turning a listing page into product records.
///
/// Output follows the document order of the product cards. Cards without a
/// title are skipped; every other missing field falls back to a default.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn extract(&self, page: &RawPage) -> Result<Vec<ProductRecord>, ExtractorError>;
}

/// CSS selectors for the listing layout. A layout change on the target site
/// should only ever mean editing these.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    pub(crate) card: String,
    pub(crate) title: String,
    pub(crate) category_label: String,
    pub(crate) price: String,
    pub(crate) description: String,
    pub(crate) detail_link: String,
    pub(crate) card_image: String,
    pub(crate) detail_image: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: ".product-card".into(),
            title: "h4.title".into(),
            category_label: ".category span".into(),
            price: ".price-wrapper".into(),
            description: ".description".into(),
            detail_link: "a.card-header".into(),
            card_image: "img".into(),
            detail_image: "img.image".into(),
        }
    }
}

impl CardSelectors {
    pub fn with_card_selector(mut self, selector: impl Into<String>) -> Self {
        self.card = selector.into();

        self
    }

    pub fn with_title_selector(mut self, selector: impl Into<String>) -> Self {
        self.title = selector.into();

        self
    }

    pub fn with_category_label_selector(mut self, selector: impl Into<String>) -> Self {
        self.category_label = selector.into();

        self
    }

    pub fn with_price_selector(mut self, selector: impl Into<String>) -> Self {
        self.price = selector.into();

        self
    }

    pub fn with_description_selector(mut self, selector: impl Into<String>) -> Self {
        self.description = selector.into();

        self
    }

    pub fn with_detail_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.detail_link = selector.into();

        self
    }

    pub fn with_card_image_selector(mut self, selector: impl Into<String>) -> Self {
        self.card_image = selector.into();

        self
    }

    pub fn with_detail_image_selector(mut self, selector: impl Into<String>) -> Self {
        self.detail_image = selector.into();

        self
    }

    /// The selector that marks a finished client-side render
    pub fn ready_selector(&self) -> &str {
        &self.card
    }
}
