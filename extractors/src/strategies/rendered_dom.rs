use async_trait::async_trait;
use common::{
    constants::RENDERED_FALLBACK_CATEGORY, modes::Strategy, record::ProductRecord,
};
use crawler::traits::RawPage;
use tracing::debug;

use crate::{
    errors::ExtractorError,
    normalizer::{flatten_categories, resolve_image_url},
    strategies::cards::CardParser,
    structures::{CardSelectors, Extractor},
};

/// Reads a DOM that a browser already hydrated, so card images are final and
/// no detail page is needed.
pub struct RenderedDomExtractor {
    parser: CardParser,
    origin: String,
}

impl RenderedDomExtractor {
    pub fn new(selectors: &CardSelectors, origin: impl Into<String>) -> Result<Self, ExtractorError> {
        Ok(Self {
            parser: CardParser::new(selectors)?,
            origin: origin.into(),
        })
    }
}

#[async_trait]
impl Extractor for RenderedDomExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::RenderedDom
    }

    async fn extract(&self, page: &RawPage) -> Result<Vec<ProductRecord>, ExtractorError> {
        if !page.rendered {
            return Err(ExtractorError::PageNotRendered(page.url.clone()));
        }

        let records = self
            .parser
            .parse_cards(&page.body)
            .into_iter()
            .map(|card| {
                let category = match card.category_labels.is_empty() {
                    true => RENDERED_FALLBACK_CATEGORY.to_string(),
                    false => flatten_categories(&card.category_labels),
                };

                let image_url = resolve_image_url(&self.origin, card.image_src.as_deref());
                debug!("Card '{}' has image {image_url:?}", card.name);

                card.into_record(&self.origin, category, image_url)
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use common::record::Price;

    use super::*;

    const ORIGIN: &str = "https://sandbox.oxylabs.io";

    fn extractor() -> RenderedDomExtractor {
        RenderedDomExtractor::new(&CardSelectors::default(), ORIGIN).unwrap()
    }

    #[tokio::test]
    async fn reads_hydrated_images_and_falls_back_to_general() {
        let page = RawPage::from_rendered(
            ORIGIN,
            r#"
            <div class="product-card">
                <a class="card-header" href="/products/5"><img src="/assets/5.webp"></a>
                <h4 class="title">Hydrated</h4>
                <div class="price-wrapper">45,00 €</div>
            </div>
            <div class="product-card">
                <img src="data:image/svg+xml;base64,PHN2Zz4=">
                <h4 class="title">Placeholder</h4>
                <div class="category"><span>Puzzle</span></div>
                <p class="description">  Tricky  </p>
            </div>
            "#,
        );

        let records = extractor().extract(&page).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://sandbox.oxylabs.io/assets/5.webp")
        );
        assert_eq!(records[0].category, RENDERED_FALLBACK_CATEGORY);
        assert_eq!(records[0].price, Price::from_cents(4500));
        assert_eq!(records[0].source_url, "https://sandbox.oxylabs.io/products/5");

        assert_eq!(records[1].image_url, None);
        assert_eq!(records[1].category, "Puzzle");
        assert_eq!(records[1].description(), Some("Tricky"));
    }

    #[tokio::test]
    async fn card_without_title_never_appears() {
        let page = RawPage::from_rendered(
            ORIGIN,
            r#"<div class="product-card"><img src="/a.png"></div>"#,
        );

        assert!(extractor().extract(&page).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn raw_server_markup_is_refused() {
        let page = RawPage::from_markup(ORIGIN, "<div></div>");

        assert!(matches!(
            extractor().extract(&page).await,
            Err(ExtractorError::PageNotRendered(_))
        ));
    }
}
