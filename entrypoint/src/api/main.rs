mod routes;
mod service_layers;

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use clap::{Parser, ValueEnum};
use common::store::ProductStore;
use importer::{
    memory_store::MemoryStore,
    queue::{DEFAULT_WORKERS, JobQueue, WorkQueue},
    worker::ImportWorker,
};
use metrics::shutdown_metrics;
use mimalloc::MiMalloc;
use mongodb_connector::connector::MongoDBConnector;
use tokio::net::TcpListener;
use tracing::{error, info};
use utils::{logger::configure_logger, telemetry::TelemetrySink};

use crate::routes::build_router;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreKind {
    Mongodb,
    /// Lost on exit, for local runs
    Memory,
}

/// Accepts product batches and imports them in the background
#[derive(Debug, Parser)]
#[command(name = "api", version)]
struct Args {
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Units imported at the same time
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    #[arg(long, value_enum, default_value_t = StoreKind::Mongodb)]
    store: StoreKind,
}

pub(crate) struct ServerState {
    pub(crate) queue: Arc<dyn JobQueue>,
}

#[tokio::main]
async fn main() -> ExitCode {
    configure_logger();

    let args = Args::parse();

    let store: Arc<dyn ProductStore> = match args.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Mongodb => match MongoDBConnector::new().await {
            Ok(connector) => Arc::new(connector),
            Err(err) => {
                error!("Failed to connect to the database: {err}");

                return ExitCode::FAILURE;
            }
        },
    };

    let worker = ImportWorker::new(store, Arc::new(TelemetrySink));
    let (queue, dispatcher) = WorkQueue::start(worker, args.workers);

    let listener = match TcpListener::bind(args.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind {}: {err}", args.bind);

            return ExitCode::FAILURE;
        }
    };

    info!("Listening on {} with {} import workers", args.bind, args.workers);

    let router = build_router(Arc::new(ServerState {
        queue: Arc::new(queue),
    }));

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down, finishing queued imports");
        })
        .await;

    // the router, and with it the last queue handle, is gone by now
    dispatcher.drained().await;
    shutdown_metrics();

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Server failed: {err}");

            ExitCode::FAILURE
        }
    }
}
