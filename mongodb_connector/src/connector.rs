use std::{env, sync::LazyLock};

use async_trait::async_trait;
use common::{
    entities::{Image, Product},
    record::ProductRecord,
    store::{ApplyOutcome, ProductStore, StoreError},
};
use mongodb::{Client, ClientSession, bson::oid::ObjectId};
use tracing::{debug, info, warn};

use crate::{
    collections::{images::ImagesCollection, products::ProductsCollection},
    constants::DATABASE_NAME,
};

static CONNECTION_URI: LazyLock<String> = LazyLock::new(|| {
    let host = env::var("MONGO_DB_HOST").unwrap_or("localhost".into());
    let port = env::var("MONGO_DB_PORT").unwrap_or("27017".into());
    let user = env::var("MONGO_DB_USER").unwrap_or("root".into());
    let password = env::var("MONGO_DB_PASSWORD").unwrap_or("root".into());

    format!("mongodb://{user}:{password}@{host}:{port}")
});

/// MongoDB-backed product store.
///
/// Multi-document transactions need a replica set (a single-node one is
/// enough). Same-name races are settled by the unique index on `name`: the
/// losing transaction fails with a write conflict and is retried by its
/// caller.
pub struct MongoDBConnector {
    // mongodb structs are already Arc, thread safe
    client: Client,
    products: ProductsCollection,
    images: ImagesCollection,
}

impl MongoDBConnector {
    pub async fn new() -> Result<Self, StoreError> {
        let client = Client::with_uri_str(CONNECTION_URI.as_str()).await?;
        let db = client.database(DATABASE_NAME);

        let products = ProductsCollection::new(&db).await?;
        let images = ImagesCollection::new(&db).await?;

        info!("Connected to database {DATABASE_NAME}");

        Ok(Self {
            client,
            products,
            images,
        })
    }

    async fn apply_in_session(
        &self,
        record: &ProductRecord,
        session: &mut ClientSession,
    ) -> Result<ApplyOutcome, StoreError> {
        let (product_id, product_created) = self.products.upsert(record, session).await?;

        let image_created = match record.image_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => self.images.attach(product_id, url, session).await?,
            None => false,
        };

        Ok(ApplyOutcome {
            product_created,
            image_created,
        })
    }

    async fn clear_in_session(&self, session: &mut ClientSession) -> Result<u64, StoreError> {
        let images = self.images.delete_all(session).await?;
        let products = self.products.delete_all(session).await?;

        debug!("Deleted {products} products and {images} images");

        Ok(products)
    }

    async fn start_transaction(&self) -> Result<ClientSession, StoreError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        Ok(session)
    }
}

/// Commits on success, otherwise rolls back and hands the original error on
async fn finish_transaction<T>(
    mut session: ClientSession,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            session.commit_transaction().await?;

            Ok(value)
        }
        Err(err) => {
            if let Err(abort_err) = session.abort_transaction().await {
                warn!("Failed to abort transaction: {abort_err}");
            }

            Err(err)
        }
    }
}

#[async_trait]
impl ProductStore for MongoDBConnector {
    async fn apply_record(&self, record: &ProductRecord) -> Result<ApplyOutcome, StoreError> {
        let mut session = self.start_transaction().await?;
        let result = self.apply_in_session(record, &mut session).await;

        finish_transaction(session, result).await
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut session = self.start_transaction().await?;
        let result = self.clear_in_session(&mut session).await;

        finish_transaction(session, result).await
    }

    async fn find_product(&self, name: &str) -> Result<Option<Product>, StoreError> {
        self.products.find_by_name(name).await
    }

    async fn images_for(&self, product_id: ObjectId) -> Result<Vec<Image>, StoreError> {
        self.images.for_product(product_id).await
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        self.products.count().await
    }
}
