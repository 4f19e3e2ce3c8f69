mod cli;
mod pipeline;
mod strategies;
mod transport;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use common::modes::RunMode;
use crawler::unprotected::UnprotectedCrawler;
use metrics::{put_metric, shutdown_metrics};
use mimalloc::MiMalloc;
use mongodb_connector::connector::MongoDBConnector;
use tracing::{error, info, warn};
use utils::logger::configure_logger;

use crate::{
    cli::Args,
    pipeline::{RunSummary, ScrapePipeline},
    strategies::build_strategy,
    transport::{BatchTransporter, TransportResult},
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    configure_logger();

    let args = Args::parse();

    let Some(pipeline) = build_pipeline(&args).await else {
        return ExitCode::FAILURE;
    };

    let result = tokio::select! {
        result = pipeline.run(&args.url, args.mode) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, nothing was sent");

            return ExitCode::from(130);
        }
    };

    let exit_code = match result {
        Ok(summary) => report(&summary),
        Err(err) if err.is_retryable() => {
            error!("Scrape failed, a later run may succeed: {err}");

            ExitCode::FAILURE
        }
        Err(err) => {
            error!("Scrape failed: {err}");

            ExitCode::FAILURE
        }
    };

    shutdown_metrics();

    exit_code
}

async fn build_pipeline(args: &Args) -> Option<ScrapePipeline> {
    let parts = match build_strategy(args) {
        Ok(parts) => parts,
        Err(err) => {
            error!("Failed to set up the {} strategy: {err}", args.strategy);

            return None;
        }
    };

    let transporter = match UnprotectedCrawler::new(args.fetch_options()) {
        Ok(crawler) => BatchTransporter::new(crawler, &args.import_endpoint),
        Err(err) => {
            error!("Failed to build the HTTP client: {err}");

            return None;
        }
    };

    let pipeline = ScrapePipeline::new(parts.fetcher, parts.extractor, transporter);

    if args.mode != RunMode::Replace {
        return Some(pipeline);
    }

    match MongoDBConnector::new().await {
        Ok(store) => Some(pipeline.with_store(Arc::new(store))),
        Err(err) => {
            error!("Replace mode needs the database: {err}");

            None
        }
    }
}

/// A failed hand-off is reported but the scrape itself still succeeded
fn report(summary: &RunSummary) -> ExitCode {
    put_metric!(Metrics::ExtractedProduct, summary.extracted as u64);

    if let Some(cleared) = summary.cleared {
        info!("Replaced {cleared} previously stored products");
    }

    match &summary.transport {
        TransportResult::Accepted { status } => {
            info!(
                "Run complete: {} products extracted, API answered {status}",
                summary.extracted
            );
        }
        TransportResult::Rejected { status, body } => {
            warn!(
                "Run complete: {} products extracted, API refused the batch ({status}): {body}",
                summary.extracted
            );
        }
        TransportResult::Failed(err) => {
            warn!(
                "Run complete: {} products extracted, API unreachable: {err}",
                summary.extracted
            );
        }
    }

    if !summary.transport.is_accepted() {
        put_metric!(Metrics::TransportFailed, 1);
    }

    ExitCode::SUCCESS
}
