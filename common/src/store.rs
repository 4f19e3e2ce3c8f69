use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::{
    entities::{Image, Product},
    record::ProductRecord,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("Failed to encode document: {0}")]
    Encoding(#[from] mongodb::bson::ser::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub product_created: bool,
    pub image_created: bool,
}

/// Durable home of products and their images.
///
/// Implementations must not assume they are the only writer: the admin
/// surface edits the same rows. `apply_record` is all-or-nothing, and two
/// calls racing on the same name must serialize inside the store.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Upserts the product keyed by name, then attaches `image_url` if it is
    /// not attached yet, in one transaction.
    async fn apply_record(&self, record: &ProductRecord) -> Result<ApplyOutcome, StoreError>;

    /// Deletes every product together with its images, returns products removed
    async fn clear(&self) -> Result<u64, StoreError>;

    async fn find_product(&self, name: &str) -> Result<Option<Product>, StoreError>;

    async fn images_for(&self, product_id: ObjectId) -> Result<Vec<Image>, StoreError>;

    async fn count_products(&self) -> Result<u64, StoreError>;
}
