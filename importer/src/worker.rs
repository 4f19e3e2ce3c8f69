use std::{sync::Arc, time::Duration};

use common::{
    constants::MAX_IMPORT_ATTEMPTS,
    record::ProductRecord,
    store::{ApplyOutcome, ProductStore},
};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::debug;

use crate::{
    errors::ImportError,
    sink::{FailureKind, ImportSink, PermanentFailure},
};

const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Grows linearly with the attempt number
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_IMPORT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Applies one unit of work to the store.
///
/// Delivery is at-least-once, so applying the same unit again must converge
/// on the same rows; the store's upserts guarantee that.
#[derive(Clone)]
pub struct ImportWorker {
    store: Arc<dyn ProductStore>,
    sink: Arc<dyn ImportSink>,
    policy: RetryPolicy,
}

impl ImportWorker {
    pub fn new(store: Arc<dyn ProductStore>, sink: Arc<dyn ImportSink>) -> Self {
        Self {
            store,
            sink,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            backoff: policy.backoff,
        };

        self
    }

    pub fn parse(unit: &Value) -> Result<ProductRecord, ImportError> {
        Ok(ProductRecord::deserialize(unit)?)
    }

    pub async fn apply(&self, record: &ProductRecord) -> Result<ApplyOutcome, ImportError> {
        Ok(self.store.apply_record(record).await?)
    }

    /// Runs a unit to its end. Never fails: every outcome goes to the sink.
    pub async fn handle(&self, unit: Value) {
        let record = match Self::parse(&unit) {
            Ok(record) => record,
            Err(err) => {
                self.sink.on_permanent_failure(PermanentFailure {
                    name: unit_name(&unit),
                    error: err.to_string(),
                    kind: FailureKind::Rejected,
                });

                return;
            }
        };

        let mut attempt = 1;

        loop {
            match self.apply(&record).await {
                Ok(outcome) => {
                    debug!("Applied '{}' on attempt {attempt}", record.name);
                    self.sink.on_applied(&record.name, outcome);

                    return;
                }
                Err(err) if err.is_retryable() && attempt < self.policy.max_attempts => {
                    self.sink.on_retry(&record.name, attempt, &err);

                    sleep(self.policy.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => {
                    let kind = match err.is_retryable() {
                        true => FailureKind::Exhausted { attempts: attempt },
                        false => FailureKind::Rejected,
                    };

                    self.sink.on_permanent_failure(PermanentFailure {
                        name: Some(record.name.clone()),
                        error: err.to_string(),
                        kind,
                    });

                    return;
                }
            }
        }
    }
}

fn unit_name(unit: &Value) -> Option<String> {
    unit.get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use common::{
        entities::{Image, Product},
        store::StoreError,
    };
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    use super::*;
    use crate::{
        memory_store::MemoryStore,
        sink::testing::{Event, RecordingSink},
    };

    pub(crate) const NO_WAIT: RetryPolicy = RetryPolicy {
        max_attempts: MAX_IMPORT_ATTEMPTS,
        backoff: Duration::ZERO,
    };

    /// Fails the first `failures` writes, then delegates
    struct FlakyStore {
        inner: MemoryStore,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyStore {
        fn failing(failures: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ProductStore for FlakyStore {
        async fn apply_record(&self, record: &ProductRecord) -> Result<ApplyOutcome, StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(StoreError::Unavailable("write conflict".into()));
            }

            self.inner.apply_record(record).await
        }

        async fn clear(&self) -> Result<u64, StoreError> {
            self.inner.clear().await
        }

        async fn find_product(&self, name: &str) -> Result<Option<Product>, StoreError> {
            self.inner.find_product(name).await
        }

        async fn images_for(&self, product_id: ObjectId) -> Result<Vec<Image>, StoreError> {
            self.inner.images_for(product_id).await
        }

        async fn count_products(&self) -> Result<u64, StoreError> {
            self.inner.count_products().await
        }
    }

    fn worker(store: Arc<dyn ProductStore>, sink: Arc<RecordingSink>) -> ImportWorker {
        ImportWorker::new(store, sink).with_retry_policy(NO_WAIT)
    }

    fn unit(price: f64, image: &str) -> Value {
        json!({
            "name": "Test Game",
            "price": price,
            "image_url": image,
            "source_url": "https://example.com/source",
        })
    }

    #[tokio::test]
    async fn reingesting_keeps_one_product_with_latest_values() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let worker = worker(store.clone(), sink.clone());

        worker.handle(unit(59.99, "")).await;
        worker
            .handle(json!({
                "name": "Test Game",
                "price": 49.99,
                "source_url": "https://example.com/updated",
                "category": "Sale",
                "attributes": {"description": "Cheaper now"},
            }))
            .await;

        assert_eq!(store.count_products().await.unwrap(), 1);

        let product = store.find_product("Test Game").await.unwrap().unwrap();
        assert_eq!(product.price.cents(), 4999);
        assert_eq!(product.source_url, "https://example.com/updated");
        assert_eq!(product.category, "Sale");
        assert_eq!(product.attributes["description"], json!("Cheaper now"));
        assert!(sink.failures().is_empty());
    }

    #[tokio::test]
    async fn missing_category_is_stored_as_uncategorized() {
        let store = Arc::new(MemoryStore::new());
        let worker = worker(store.clone(), Arc::new(RecordingSink::default()));

        worker.handle(unit(1.0, "")).await;

        let product = store.find_product("Test Game").await.unwrap().unwrap();
        assert_eq!(product.category, "Uncategorized");
        assert!(product.attributes.is_empty());
    }

    #[tokio::test]
    async fn same_image_twice_is_attached_once() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let worker = worker(store.clone(), sink.clone());

        worker.handle(unit(1.0, "https://example.com/a.png")).await;
        worker.handle(unit(1.0, "https://example.com/a.png")).await;
        worker.handle(unit(1.0, "https://example.com/b.png")).await;

        let product = store.find_product("Test Game").await.unwrap().unwrap();
        assert_eq!(store.images_for(product.id).await.unwrap().len(), 2);

        let image_created: Vec<bool> = sink
            .events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Applied(_, outcome) => Some(outcome.image_created),
                _ => None,
            })
            .collect();
        assert_eq!(image_created, vec![true, false, true]);
    }

    #[tokio::test]
    async fn nameless_units_are_rejected_without_retry() {
        let store = Arc::new(FlakyStore::failing(0));
        let sink = Arc::new(RecordingSink::default());
        let worker = worker(store.clone(), sink.clone());

        worker
            .handle(json!({"price": 1.0, "source_url": "https://example.com"}))
            .await;
        worker
            .handle(json!({"name": "   ", "price": 1.0, "source_url": "https://example.com"}))
            .await;

        let failures = sink.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|failure| failure.kind == FailureKind::Rejected));
        assert!(failures.iter().all(|failure| failure.name.is_none()));
        assert_eq!(sink.events().len(), 2);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn negative_price_is_rejected_with_its_name() {
        let sink = Arc::new(RecordingSink::default());
        let worker = worker(Arc::new(MemoryStore::new()), sink.clone());

        worker.handle(unit(-5.0, "")).await;

        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Rejected);
        assert_eq!(failures[0].name.as_deref(), Some("Test Game"));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let store = Arc::new(FlakyStore::failing(2));
        let sink = Arc::new(RecordingSink::default());
        let worker = worker(store.clone(), sink.clone());

        worker.handle(unit(1.0, "")).await;

        assert_eq!(
            sink.events(),
            vec![
                Event::Retried("Test Game".into(), 1),
                Event::Retried("Test Game".into(), 2),
                Event::Applied(
                    "Test Game".into(),
                    ApplyOutcome {
                        product_created: true,
                        image_created: false
                    }
                ),
            ]
        );
        assert_eq!(store.count_products().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn persistent_failure_is_reported_once_after_three_attempts() {
        let store = Arc::new(FlakyStore::failing(u32::MAX));
        let sink = Arc::new(RecordingSink::default());
        let worker = worker(store.clone(), sink.clone());

        worker.handle(unit(1.0, "")).await;

        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::Exhausted { attempts: 3 });
        assert!(failures[0].error.contains("write conflict"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.count_products().await.unwrap(), 0);
    }
}
