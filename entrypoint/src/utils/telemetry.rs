use common::store::ApplyOutcome;
use importer::{
    errors::ImportError,
    sink::{ImportSink, PermanentFailure},
};
use metrics::put_metric;
use tracing::{error, info, warn};

/// Reports import outcomes as log lines and counters
pub struct TelemetrySink;

impl ImportSink for TelemetrySink {
    fn on_applied(&self, name: &str, outcome: ApplyOutcome) {
        info!(
            "Imported '{name}' (new product: {}, new image: {})",
            outcome.product_created, outcome.image_created
        );

        put_metric!(Metrics::ImportApplied, 1);
    }

    fn on_retry(&self, name: &str, attempt: u32, error: &ImportError) {
        warn!("Attempt {attempt} to import '{name}' failed, retrying: {error}");

        put_metric!(Metrics::ImportRetried, 1);
    }

    fn on_permanent_failure(&self, failure: PermanentFailure) {
        let name = failure.name.as_deref().unwrap_or("<unnamed>");

        error!(
            "Giving up on '{name}', {}: {}",
            failure.kind, failure.error
        );

        put_metric!(Metrics::ImportFailed, 1, "kind" => failure.kind.to_string());
    }
}
