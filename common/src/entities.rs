use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{Price, ProductRecord};

/// Persisted product, unique on `name`. Later scrapes update it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub price: Price,
    pub source_url: String,
    pub category: String,
    pub attributes: Map<String, Value>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Product {
    pub fn from_record(record: &ProductRecord) -> Self {
        let now = DateTime::now();

        Self {
            id: ObjectId::new(),
            name: record.name.clone(),
            price: record.price,
            source_url: record.source_url.clone(),
            category: record.category.clone(),
            attributes: record.attributes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every mutable field, the name stays the key
    pub fn apply(&mut self, record: &ProductRecord) {
        self.price = record.price;
        self.source_url = record.source_url.clone();
        self.category = record.category.clone();
        self.attributes = record.attributes.clone();
        self.updated_at = DateTime::now();
    }
}

/// Image URL attached to a product, unique per `(product_id, url)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub product_id: ObjectId,
    pub url: String,
    pub created_at: DateTime,
}

impl Image {
    pub fn new(product_id: ObjectId, url: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            product_id,
            url: url.into(),
            created_at: DateTime::now(),
        }
    }
}
