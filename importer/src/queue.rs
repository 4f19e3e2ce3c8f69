use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::{
    sync::{Semaphore, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{errors::QueueError, worker::ImportWorker};

pub const DEFAULT_WORKERS: usize = 8;

/// Accepts units of work. Handing a unit over never waits on storage.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, unit: Value) -> Result<(), QueueError>;
}

/// In-process queue feeding a bounded pool of import workers.
///
/// Units live only in memory; anything still queued when the process dies
/// is lost, which is acceptable because the scraper can be re-run.
#[derive(Clone)]
pub struct WorkQueue {
    sender: mpsc::UnboundedSender<Value>,
}

/// Owns the dispatch loop, await `drained` after every `WorkQueue` clone is
/// dropped to let in-flight units finish
pub struct Dispatcher {
    handle: JoinHandle<()>,
}

impl WorkQueue {
    pub fn start(worker: ImportWorker, workers: usize) -> (Self, Dispatcher) {
        // unbounded: a stalled store grows this backlog in memory, backpressure
        // belongs to a durable broker implementing `JobQueue`
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(dispatch(receiver, worker, workers.max(1)));

        (Self { sender }, Dispatcher { handle })
    }
}

#[async_trait]
impl JobQueue for WorkQueue {
    async fn enqueue(&self, unit: Value) -> Result<(), QueueError> {
        self.sender.send(unit).map_err(|_| QueueError::Closed)
    }
}

impl Dispatcher {
    pub async fn drained(self) {
        if let Err(err) = self.handle.await {
            warn!("Work queue dispatcher ended abnormally: {err}");
        }
    }
}

async fn dispatch(mut receiver: mpsc::UnboundedReceiver<Value>, worker: ImportWorker, workers: usize) {
    let permits = Arc::new(Semaphore::new(workers));

    while let Some(unit) = receiver.recv().await {
        // the semaphore is never closed
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };

        let worker = worker.clone();

        tokio::spawn(async move {
            worker.handle(unit).await;
            drop(permit);
        });
    }

    debug!("Work queue closed, waiting for in-flight units");

    if permits.acquire_many(workers as u32).await.is_ok() {
        info!("Work queue drained");
    }
}
