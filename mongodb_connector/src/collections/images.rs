use common::{entities::Image, store::StoreError};
use mongodb::{
    ClientSession, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc, oid::ObjectId},
    options::IndexOptions,
};

use crate::{
    collections::ensure_collection,
    constants::{COLLECTION_IMAGES_NAME, COLLECTION_IMAGES_URL_INDEX},
};

pub(crate) struct ImagesCollection {
    collection: Collection<Image>,
}

impl ImagesCollection {
    pub(crate) async fn new(db: &Database) -> Result<Self, StoreError> {
        ensure_collection(db, COLLECTION_IMAGES_NAME).await?;

        let collection = db.collection::<Image>(COLLECTION_IMAGES_NAME);

        let url_index = IndexModel::builder()
            .keys(doc! {"product_id": 1, "url": 1})
            .options(
                IndexOptions::builder()
                    .name(COLLECTION_IMAGES_URL_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        collection.create_index(url_index).await?;

        Ok(Self { collection })
    }

    /// Returns whether the image was newly attached
    pub(crate) async fn attach(
        &self,
        product_id: ObjectId,
        url: &str,
        session: &mut ClientSession,
    ) -> Result<bool, StoreError> {
        let result = self
            .collection
            .update_one(
                doc! {"product_id": product_id, "url": url},
                image_attach_update(DateTime::now()),
            )
            .upsert(true)
            .session(&mut *session)
            .await?;

        Ok(result.upserted_id.is_some())
    }

    pub(crate) async fn for_product(&self, product_id: ObjectId) -> Result<Vec<Image>, StoreError> {
        let mut cursor = self
            .collection
            .find(doc! {"product_id": product_id})
            .sort(doc! {"created_at": 1})
            .await?;

        let mut results: Vec<Image> = Vec::new();

        while cursor.advance().await? {
            results.push(cursor.deserialize_current()?);
        }

        Ok(results)
    }

    pub(crate) async fn delete_all(&self, session: &mut ClientSession) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_many(doc! {})
            .session(&mut *session)
            .await?;

        Ok(result.deleted_count)
    }
}

/// An existing `(product_id, url)` row is left untouched
fn image_attach_update(now: DateTime) -> Document {
    doc! {"$setOnInsert": {"created_at": now}}
}
