use std::fmt::{Display, Formatter};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error, Visitor},
};
use serde_json::{Map, Value};

use crate::{
    constants::{DEFAULT_CATEGORY, DESCRIPTION_ATTRIBUTE},
    deserialize_disallow_empty_string::{disallow_empty_string, empty_string_as_none},
};

/// Non-negative amount with exactly two fractional digits, held as cents.
///
/// On the wire (and in storage) it is a plain JSON number, `1234.5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u64,
}

impl Price {
    pub const ZERO: Price = Price { cents: 0 };

    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// The site's own notation, comma as decimal separator: `1234,50`
    pub fn to_locale_text(&self) -> String {
        format!("{},{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Display for Price {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        write!(formatter, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a non-negative number")
    }

    fn visit_u64<E: Error>(self, value: u64) -> Result<Price, E> {
        value
            .checked_mul(100)
            .map(Price::from_cents)
            .ok_or_else(|| E::custom("price is too large"))
    }

    fn visit_i64<E: Error>(self, value: i64) -> Result<Price, E> {
        let Ok(value) = u64::try_from(value) else {
            return Err(E::custom("price is negative"));
        };

        self.visit_u64(value)
    }

    fn visit_f64<E: Error>(self, value: f64) -> Result<Price, E> {
        if !value.is_finite() || value < 0.0 {
            return Err(E::custom("price is negative or not a number"));
        }

        let cents = (value * 100.0).round();

        if cents > u64::MAX as f64 {
            return Err(E::custom("price is too large"));
        }

        Ok(Price::from_cents(cents as u64))
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// One normalized product listing, the unit exchanged between the scraper
/// and the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(deserialize_with = "disallow_empty_string")]
    pub name: String,
    pub price: Price,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub image_url: Option<String>,
    pub source_url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ProductRecord {
    pub fn new(name: impl Into<String>, price: Price, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            image_url: None,
            source_url: source_url.into(),
            category: String::new(),
            attributes: Map::new(),
        }
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.attributes.insert(
            DESCRIPTION_ATTRIBUTE.to_string(),
            Value::String(description.into()),
        );
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.attributes
            .get(DESCRIPTION_ATTRIBUTE)
            .and_then(Value::as_str)
    }
}
