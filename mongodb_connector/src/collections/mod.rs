pub(crate) mod images;
pub(crate) mod products;

use common::store::StoreError;
use mongodb::Database;
use tracing::info;

/// Creates `name` unless a previous start already did
pub(crate) async fn ensure_collection(db: &Database, name: &str) -> Result<(), StoreError> {
    let existing = db.list_collection_names().await?;

    if !existing.iter().any(|collection| collection == name) {
        info!("Creating collection {name}");
        db.create_collection(name).await?;
    }

    Ok(())
}
