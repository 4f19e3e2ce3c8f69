use async_trait::async_trait;
use common::{modes::Strategy, record::ProductRecord};
use crawler::traits::RawPage;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    errors::ExtractorError,
    normalizer::{flatten_categories, resolve_image_url},
    strategies::cards::CardParser,
    structures::{CardSelectors, Extractor},
    utils::{
        html::{element_to_text, parse_selector},
        json::{json_get_array, json_get_path},
    },
};

const NEXT_DATA_SELECTOR: &str = r#"script[id="__NEXT_DATA__"]"#;
const PRODUCTS_PATH: [&str; 3] = ["props", "pageProps", "products"];

/// Checked in order, the first key holding a string wins
const IMAGE_KEYS: [&str; 4] = ["image", "img", "thumbnail", "url"];

/// Cards from the server HTML, images from the hydration blob.
///
/// Card `i` takes the image of blob entry `i`, where `i` counts every card in
/// the document, untitled ones included. This pairing only holds while the
/// site renders cards in the same order as its `products` array; when the
/// counts diverge the extra cards get no image. Cards are never matched to
/// entries by name.
pub struct EmbeddedDataExtractor {
    parser: CardParser,
    origin: String,
    blob: Selector,
}

impl EmbeddedDataExtractor {
    pub fn new(selectors: &CardSelectors, origin: impl Into<String>) -> Result<Self, ExtractorError> {
        Ok(Self {
            parser: CardParser::new(selectors)?,
            origin: origin.into(),
            blob: parse_selector(NEXT_DATA_SELECTOR)?,
        })
    }

    /// One entry per blob product, `None` where no image key is set
    fn embedded_images(&self, body: &str) -> Result<Vec<Option<String>>, ExtractorError> {
        let raw_json = {
            let html = Html::parse_document(body);

            let Some(script) = html.select(&self.blob).next() else {
                return Err(ExtractorError::EmbeddedDataMissingKey(
                    "__NEXT_DATA__ script".into(),
                ));
            };

            element_to_text(script)
        };

        let json: Value = serde_json::from_str(&raw_json)?;
        let products = json_get_array(json_get_path(&json, &PRODUCTS_PATH)?)?;

        Ok(products.iter().map(image_from_entry).collect())
    }
}

fn image_from_entry(entry: &Value) -> Option<String> {
    IMAGE_KEYS
        .iter()
        .find_map(|key| entry.get(key).and_then(Value::as_str))
        .map(String::from)
}

#[async_trait]
impl Extractor for EmbeddedDataExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::EmbeddedData
    }

    async fn extract(&self, page: &RawPage) -> Result<Vec<ProductRecord>, ExtractorError> {
        let images = match self.embedded_images(&page.body) {
            Ok(images) => {
                info!("Extracted {} images from embedded data", images.len());
                images
            }
            Err(err) => {
                warn!("Could not read embedded image data, images will be missing: {err}");
                Vec::new()
            }
        };

        let cards = self.parser.parse_cards(&page.body);

        if let Some(last_card) = cards.last()
            && last_card.index >= images.len()
        {
            warn!(
                "Page has more cards than embedded entries ({}), trailing cards get no image",
                images.len()
            );
        }

        let records = cards
            .into_iter()
            .map(|card| {
                let image = images.get(card.index).cloned().flatten();
                let image_url = resolve_image_url(&self.origin, image.as_deref());
                debug!("Card {} '{}' paired with image {image_url:?}", card.index, card.name);

                let category = flatten_categories(&card.category_labels);
                card.into_record(&self.origin, category, image_url)
            })
            .collect();

        Ok(records)
    }
}
