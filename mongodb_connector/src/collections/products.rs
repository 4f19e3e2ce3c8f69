use common::{entities::Product, record::ProductRecord, store::StoreError};
use mongodb::{
    ClientSession, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc, oid::ObjectId, to_document},
    options::{IndexOptions, ReturnDocument},
};

use crate::{
    collections::ensure_collection,
    constants::{COLLECTION_PRODUCTS_NAME, COLLECTION_PRODUCTS_NAME_INDEX},
};

pub(crate) struct ProductsCollection {
    collection: Collection<Product>,
}

impl ProductsCollection {
    pub(crate) async fn new(db: &Database) -> Result<Self, StoreError> {
        ensure_collection(db, COLLECTION_PRODUCTS_NAME).await?;

        let collection = db.collection::<Product>(COLLECTION_PRODUCTS_NAME);
        Self::create_indexes(&collection).await?;

        Ok(Self { collection })
    }

    async fn create_indexes(collection: &Collection<Product>) -> Result<(), StoreError> {
        let name_index = IndexModel::builder()
            .keys(doc! {"name": 1})
            .options(
                IndexOptions::builder()
                    .name(COLLECTION_PRODUCTS_NAME_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        collection.create_index(name_index).await?;

        Ok(())
    }

    /// Returns the product id and whether this call inserted it
    pub(crate) async fn upsert(
        &self,
        record: &ProductRecord,
        session: &mut ClientSession,
    ) -> Result<(ObjectId, bool), StoreError> {
        let new_id = ObjectId::new();
        let update = product_upsert_update(record, new_id, DateTime::now())?;

        let product = self
            .collection
            .find_one_and_update(doc! {"name": &record.name}, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await?;

        let Some(product) = product else {
            return Err(StoreError::Unavailable(format!(
                "upsert of '{}' returned no document",
                record.name
            )));
        };

        Ok((product.id, product.id == new_id))
    }

    pub(crate) async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.collection.find_one(doc! {"name": name}).await?)
    }

    pub(crate) async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(doc! {}).await?)
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

/// Update for an upsert keyed by `name`.
///
/// Every mutable field is overwritten; the identity and creation time are
/// only written when the row is new. The name itself comes from the filter.
pub(crate) fn product_upsert_update(
    record: &ProductRecord,
    new_id: ObjectId,
    now: DateTime,
) -> Result<Document, StoreError> {
    let attributes = to_document(&record.attributes)?;

    Ok(doc! {
        "$set": {
            "price": record.price.as_f64(),
            "source_url": &record.source_url,
            "category": &record.category,
            "attributes": attributes,
            "updated_at": now,
        },
        "$setOnInsert": {
            "_id": new_id,
            "created_at": now,
        },
    })
}

#[cfg(test)]
mod tests {
    use common::record::Price;
    use mongodb::bson::Bson;

    use super::*;

    #[test]
    fn update_overwrites_fields_and_only_seeds_identity() {
        let record = ProductRecord::new("Widget", Price::from_cents(123450), "https://s.test/p/1")
            .with_category("Tools")
            .with_description("Sturdy");
        let id = ObjectId::new();
        let now = DateTime::from_millis(1_700_000_000_000);

        let update = product_upsert_update(&record, id, now).unwrap();

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get("price"), Some(&Bson::Double(1234.5)));
        assert_eq!(set.get_str("source_url").unwrap(), "https://s.test/p/1");
        assert_eq!(set.get_str("category").unwrap(), "Tools");
        assert_eq!(
            set.get_document("attributes").unwrap(),
            &doc! {"description": "Sturdy"}
        );
        assert_eq!(set.get_datetime("updated_at").unwrap(), &now);
        assert!(!set.contains_key("name"));

        let set_on_insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(set_on_insert.get_object_id("_id").unwrap(), id);
        assert_eq!(set_on_insert.get_datetime("created_at").unwrap(), &now);
        assert!(!set_on_insert.contains_key("updated_at"));
    }

    #[test]
    fn nested_attributes_survive_encoding() {
        let mut record = ProductRecord::new("Widget", Price::ZERO, "https://s.test");
        record.attributes = serde_json::from_value(serde_json::json!({
            "description": "",
            "specs": {"weight": 2, "tags": ["a", "b"]}
        }))
        .unwrap();

        let update = product_upsert_update(&record, ObjectId::new(), DateTime::now()).unwrap();
        let attributes = update
            .get_document("$set")
            .unwrap()
            .get_document("attributes")
            .unwrap();

        assert_eq!(attributes.get_str("description").unwrap(), "");
        assert_eq!(
            attributes.get_document("specs").unwrap().get_array("tags").unwrap().len(),
            2
        );
    }
}
