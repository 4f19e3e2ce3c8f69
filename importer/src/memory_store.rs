use async_trait::async_trait;
use common::{
    entities::{Image, Product},
    record::ProductRecord,
    store::{ApplyOutcome, ProductStore, StoreError},
};
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    products: Vec<Product>,
    images: Vec<Image>,
}

/// Process-local store. A single lock around both tables makes every
/// `apply_record` atomic and serializes writers racing on one name.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn apply_record(&self, record: &ProductRecord) -> Result<ApplyOutcome, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut outcome = ApplyOutcome::default();

        let existing = tables
            .products
            .iter()
            .position(|product| product.name == record.name);

        let product_id = match existing {
            Some(position) => {
                let product = &mut tables.products[position];
                product.apply(record);

                product.id
            }
            None => {
                let product = Product::from_record(record);
                let id = product.id;

                tables.products.push(product);
                outcome.product_created = true;

                id
            }
        };

        if let Some(url) = record.image_url.as_deref().filter(|url| !url.is_empty()) {
            let attached = tables
                .images
                .iter()
                .any(|image| image.product_id == product_id && image.url == url);

            if !attached {
                tables.images.push(Image::new(product_id, url));
                outcome.image_created = true;
            }
        }

        Ok(outcome)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let removed = tables.products.len() as u64;

        tables.products.clear();
        tables.images.clear();

        Ok(removed)
    }

    async fn find_product(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .products
            .iter()
            .find(|product| product.name == name)
            .cloned())
    }

    async fn images_for(&self, product_id: ObjectId) -> Result<Vec<Image>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .images
            .iter()
            .filter(|image| image.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        Ok(self.tables.lock().await.products.len() as u64)
    }
}
