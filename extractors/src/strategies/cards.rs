use common::record::{Price, ProductRecord};
use scraper::{Html, Selector};
use tracing::trace;

use crate::{
    errors::ExtractorError,
    normalizer::{absolutize_url, parse_price},
    structures::CardSelectors,
    utils::html::{
        element_extract_attr, element_to_text, extract_element_from_element, first_real_image_src,
        parse_selector,
    },
};

/// Card-level fields, read the same way by every strategy
#[derive(Debug, Clone)]
pub(crate) struct CardFields {
    /// Position among all cards of the document, skipped ones included
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) price: Price,
    pub(crate) category_labels: Vec<String>,
    pub(crate) description: String,
    pub(crate) detail_path: Option<String>,
    pub(crate) image_src: Option<String>,
}

impl CardFields {
    pub(crate) fn source_url(&self, origin: &str) -> String {
        absolutize_url(origin, self.detail_path.as_deref().unwrap_or_default())
    }

    pub(crate) fn into_record(
        self,
        origin: &str,
        category: String,
        image_url: Option<String>,
    ) -> ProductRecord {
        let source_url = self.source_url(origin);

        ProductRecord::new(self.name, self.price, source_url)
            .with_category(category)
            .with_image_url(image_url)
            .with_description(self.description)
    }
}

pub(crate) struct CardParser {
    card: Selector,
    title: Selector,
    category_label: Selector,
    price: Selector,
    description: Selector,
    detail_link: Selector,
    card_image: Selector,
    detail_image: Selector,
}

impl CardParser {
    pub(crate) fn new(selectors: &CardSelectors) -> Result<Self, ExtractorError> {
        Ok(Self {
            card: parse_selector(&selectors.card)?,
            title: parse_selector(&selectors.title)?,
            category_label: parse_selector(&selectors.category_label)?,
            price: parse_selector(&selectors.price)?,
            description: parse_selector(&selectors.description)?,
            detail_link: parse_selector(&selectors.detail_link)?,
            card_image: parse_selector(&selectors.card_image)?,
            detail_image: parse_selector(&selectors.detail_image)?,
        })
    }

    /// Reads every card with a non-blank title, in document order.
    ///
    /// The parsed document never outlives this call so the result can be
    /// carried across awaits.
    pub(crate) fn parse_cards(&self, body: &str) -> Vec<CardFields> {
        let html = Html::parse_document(body);
        let mut cards = Vec::new();

        for (index, card) in html.select(&self.card).enumerate() {
            let Some(title) = extract_element_from_element(card, &self.title) else {
                trace!("Skipping card {index}, it has no title");
                continue;
            };

            let name = element_to_text(title);
            if name.is_empty() {
                trace!("Skipping card {index}, its title is blank");
                continue;
            }

            let price = extract_element_from_element(card, &self.price)
                .map(|price| parse_price(&element_to_text(price)))
                .unwrap_or_default();

            let description = extract_element_from_element(card, &self.description)
                .map(element_to_text)
                .unwrap_or_default();

            let detail_path = extract_element_from_element(card, &self.detail_link)
                .and_then(|link| element_extract_attr(link, "href"));

            cards.push(CardFields {
                index,
                name,
                price,
                category_labels: card.select(&self.category_label).map(element_to_text).collect(),
                description,
                detail_path,
                image_src: first_real_image_src(card, &self.card_image),
            });
        }

        cards
    }

    /// Image address from a product detail page
    pub(crate) fn parse_detail_image(&self, body: &str) -> Option<String> {
        let html = Html::parse_document(body);

        first_real_image_src(html.root_element(), &self.detail_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CardParser {
        CardParser::new(&CardSelectors::default()).unwrap()
    }

    #[test]
    fn reads_every_field_of_a_card() {
        let body = r#"
            <div class="product-card">
                <a class="card-header" href="/products/7"><img src="/img/7.png"></a>
                <h4 class="title">  The Legend of Zelda  </h4>
                <div class="category"><span>Action</span><span></span><span>Adventure</span></div>
                <p class="description"> Classic. </p>
                <div class="price-wrapper">91,99 €</div>
            </div>
        "#;

        let cards = parser().parse_cards(body);

        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.name, "The Legend of Zelda");
        assert_eq!(card.price, Price::from_cents(9199));
        assert_eq!(card.category_labels, vec!["Action", "", "Adventure"]);
        assert_eq!(card.description, "Classic.");
        assert_eq!(card.detail_path.as_deref(), Some("/products/7"));
        assert_eq!(card.image_src.as_deref(), Some("/img/7.png"));
    }

    #[test]
    fn untitled_cards_are_skipped_but_keep_their_position() {
        let body = r#"
            <div class="product-card"><div class="price-wrapper">1,00</div></div>
            <div class="product-card"><h4 class="title">Second</h4></div>
        "#;

        let cards = parser().parse_cards(body);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Second");
        assert_eq!(cards[0].index, 1);
        assert_eq!(cards[0].price, Price::ZERO);
        assert_eq!(cards[0].detail_path, None);
    }

    #[test]
    fn blank_titles_are_skipped_but_keep_their_position() {
        let body = r#"
            <div class="product-card"><h4 class="title">   </h4><div class="price-wrapper">5,00</div></div>
            <div class="product-card"><h4 class="title"></h4></div>
            <div class="product-card"><h4 class="title">Third</h4></div>
        "#;

        let cards = parser().parse_cards(body);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].name, "Third");
        assert_eq!(cards[0].index, 2);
    }

    #[test]
    fn source_url_falls_back_to_origin() {
        let cards = parser().parse_cards(r#"<div class="product-card"><h4 class="title">A</h4></div>"#);

        assert_eq!(cards[0].source_url("https://s.test"), "https://s.test");
    }

    #[test]
    fn detail_image_skips_inline_placeholders() {
        let body = r#"
            <img class="image" src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">
            <img class="image" src="/assets/full.jpg">
        "#;

        assert_eq!(
            parser().parse_detail_image(body).as_deref(),
            Some("/assets/full.jpg")
        );
        assert_eq!(parser().parse_detail_image("<p>nothing</p>"), None);
    }

    #[test]
    fn invalid_selectors_are_reported() {
        let selectors = CardSelectors::default().with_title_selector("h4[");

        assert!(matches!(
            CardParser::new(&selectors),
            Err(ExtractorError::InvalidSelector(selector)) if selector == "h4["
        ));
    }
}
