use std::{env, sync::LazyLock};

use strum_macros::{EnumIter, IntoStaticStr};
use tracing::warn;

static CONNECTION_URI: LazyLock<String> = LazyLock::new(|| {
    let host = env::var("PROMETHEUS_HOST").unwrap_or("localhost".into());
    let port = env::var("PROMETHEUS_PORT").unwrap_or("9090".into());

    format!("http://{host}:{port}/api/v1/otlp/v1/metrics")
});

const SERVICE_NAME: &str = "product-scraper";

#[derive(Debug, EnumIter, IntoStaticStr, Hash, Eq, PartialEq)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Metrics {
    /// Counter for records built from listing cards
    ExtractedProduct,
    /// Counter for batches the ingestion endpoint did not accept
    TransportFailed,
    /// Counter for units written to storage
    ImportApplied,
    /// Counter for storage attempts that will be retried
    ImportRetried,
    /// Counter for units given up on, labelled by failure kind
    ImportFailed,
}

pub mod _private {
    pub use opentelemetry::KeyValue;

    use std::{collections::HashMap, sync::LazyLock, time::Duration};

    use opentelemetry::{
        global,
        metrics::{Counter, Meter},
    };
    use opentelemetry_otlp::{MetricExporter, Protocol, WithExportConfig};
    use opentelemetry_sdk::{
        Resource,
        metrics::{PeriodicReader, SdkMeterProvider},
    };
    use strum::IntoEnumIterator;

    use crate::{CONNECTION_URI, Metrics, SERVICE_NAME};

    static OTEL_METER: LazyLock<Meter> = LazyLock::new(|| {
        global::set_meter_provider(PROVIDER.clone());
        global::meter(SERVICE_NAME)
    });

    pub static PROVIDER: LazyLock<SdkMeterProvider> = LazyLock::new(|| {
        let exporter = MetricExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(CONNECTION_URI.to_string())
            .build()
            .expect("Expect Prometheus exporter to build");

        let reader = PeriodicReader::builder(exporter)
            .with_interval(Duration::from_secs(1))
            .build();

        let resource = Resource::builder().with_service_name(SERVICE_NAME).build();

        SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build()
    });

    pub static COUNTERS: LazyLock<HashMap<Metrics, Counter<u64>>> = LazyLock::new(|| {
        let mut mapping: HashMap<Metrics, Counter<u64>> = HashMap::new();

        for metric in crate::Metrics::iter() {
            let name: &'static str = (&metric).into();
            let metric_meter = OTEL_METER.u64_counter(name).build();

            mapping.insert(metric, metric_meter);
        }

        mapping
    });
}

/// Flushes buffered counters, call once before the process exits
pub fn shutdown_metrics() {
    if let Err(err) = _private::PROVIDER.shutdown() {
        warn!("Failed to flush metrics: {err}");
    }
}

#[macro_export]
macro_rules! put_metric {
    ($metric_name:expr, $added_value:expr $(, $key:literal => $value:expr)* $(,)?) => {
        use $crate::_private::{KeyValue, COUNTERS};
        use $crate::Metrics;

        let metric_name: Metrics = $metric_name;
        let added_value: u64 = $added_value;

        let attributes: &[KeyValue] = &[
            $(KeyValue::new($key, $value),)*
        ];

        if let Some(counter) = COUNTERS.get(&metric_name) {
            counter.add(added_value, attributes);
        }
    };
}
