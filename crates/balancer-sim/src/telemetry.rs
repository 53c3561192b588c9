//! # Telemetry Features
//!
//! Console logging through `tracing_subscriber::fmt` is always installed. On
//! top of it, OpenTelemetry tracing and metrics can be switched on and
//! exported to stdout.
//!
//! ## Feature matrix
//!
//! - `tracing`: Enables `tracing` events in the balancer and OpenTelemetry
//!   spans.
//! - `metrics`: Enables OpenTelemetry counters for the run's outcomes.
//! - `stdout`: Enables the stdout exporter.
//!
//! ## Feature constraints
//!
//! - The exporter requires at least one of: `tracing` or `metrics`.
//!
//! ## Example usage
//!
//! Export spans and metrics to stdout:
//!
//! ```bash
//! cargo run -p balancer-sim --features tracing,metrics,stdout -- 4 10
//! ```
//!
//! Raise the log level to see scaling decisions:
//!
//! ```bash
//! RUST_LOG=debug cargo run -p balancer-sim -- 4 10
//! ```

// Disallow using `stdout` without `tracing` or `metrics`
#[cfg(all(feature = "stdout", not(any(feature = "tracing", feature = "metrics"))))]
compile_error!(
    "The 'stdout' feature requires at least one of 'tracing' or 'metrics' to be enabled."
);

// Core imports - always needed
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Metrics-specific imports
#[cfg(feature = "metrics")]
use balancer::RunSummary;
#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Gauge, Meter};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

// Either
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_sdk::Resource;
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_semantic_conventions as semvcns;

// Tracing-specific imports
#[cfg(feature = "tracing")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "tracing")]
use opentelemetry_sdk::trace as sdktrace;

pub struct TelemetryProviders {
    #[cfg(feature = "tracing")]
    pub tracer_provider: sdktrace::SdkTracerProvider,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "tracing")]
    let tracer_provider = init_tracer();

    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics();

    #[cfg(any(feature = "metrics", feature = "tracing"))]
    let scope = InstrumentationScope::builder("balancer")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semvcns::SCHEMA_URL)
        .build();

    // Console output goes to stderr so stdout only carries the program's own
    // messages.
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        );

    #[cfg(feature = "tracing")]
    let registry = {
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        registry.with(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer_with_scope(scope.clone()))
                .with_error_records_to_exceptions(true),
        )
    };

    #[cfg(feature = "metrics")]
    let registry = {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let meter = opentelemetry::global::meter_with_scope(scope);
        init_metric_handles(meter);

        registry.with(tracing_opentelemetry::MetricsLayer::new(
            meter_provider.clone(),
        ))
    };

    registry.try_init()?;

    Ok(TelemetryProviders {
        #[cfg(feature = "tracing")]
        tracer_provider,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

impl TelemetryProviders {
    /// Flushes and shuts down every enabled provider.
    pub fn shutdown(self) {
        #[cfg(feature = "tracing")]
        {
            if let Err(err) = self.tracer_provider.force_flush() {
                eprintln!("Error flushing traces: {err:#?}");
            }
            if let Err(err) = self.tracer_provider.shutdown() {
                eprintln!("Error shutting down tracer: {err:#?}");
            }
        }

        #[cfg(feature = "metrics")]
        {
            if let Err(err) = self.meter_provider.force_flush() {
                eprintln!("Error flushing metrics: {err:#?}");
            }
            if let Err(err) = self.meter_provider.shutdown() {
                eprintln!("Error shutting down meter: {err:#?}");
            }
        }
    }
}

#[cfg(any(feature = "metrics", feature = "tracing"))]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name("balancer-sim")
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    builder.build()
}

#[cfg(feature = "tracing")]
fn init_tracer() -> sdktrace::SdkTracerProvider {
    let builder = sdktrace::SdkTracerProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::SpanExporter;
        let exporter = SpanExporter::default();
        let batch = sdktrace::BatchSpanProcessor::builder(exporter)
            .with_batch_config(
                sdktrace::BatchConfigBuilder::default()
                    .with_scheduled_delay(std::time::Duration::from_secs(5))
                    .with_max_queue_size(2048)
                    .build(),
            )
            .build();
        builder.with_span_processor(batch)
    };

    builder.build()
}

// Metric handles - only compiled when metrics feature is enabled
#[cfg(feature = "metrics")]
static REQUESTS_COMPLETED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static REQUESTS_BLOCKED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static REQUESTS_REJECTED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static WORKERS_ADDED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static WORKERS_REMOVED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static POOL_SIZE: OnceLock<Gauge<u64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = REQUESTS_COMPLETED.set(
        meter
            .u64_counter("requests_completed")
            .with_description("Requests processed by a worker")
            .build(),
    );

    let _ = REQUESTS_BLOCKED.set(
        meter
            .u64_counter("requests_blocked")
            .with_description("Requests dismissed by the admission filter")
            .build(),
    );

    let _ = REQUESTS_REJECTED.set(
        meter
            .u64_counter("requests_rejected")
            .with_description("Requests dismissed for a malformed source address")
            .build(),
    );

    let _ = WORKERS_ADDED.set(
        meter
            .u64_counter("workers_added")
            .with_description("Workers created by the pool scaler")
            .build(),
    );

    let _ = WORKERS_REMOVED.set(
        meter
            .u64_counter("workers_removed")
            .with_description("Workers removed by the pool scaler")
            .build(),
    );

    let _ = POOL_SIZE.set(
        meter
            .u64_gauge("pool_size")
            .with_description("Workers in the pool when the run ended")
            .build(),
    );
}

// Compiles to a no-op when metrics are disabled
#[cfg(feature = "metrics")]
pub fn record_run(summary: &RunSummary) {
    let counters = [
        (&REQUESTS_COMPLETED, summary.completed),
        (&REQUESTS_BLOCKED, summary.blocked),
        (&REQUESTS_REJECTED, summary.rejected),
        (&WORKERS_ADDED, summary.workers_added),
        (&WORKERS_REMOVED, summary.workers_removed),
    ];
    for (handle, value) in counters {
        if let Some(counter) = handle.get() {
            counter.add(value, &[]);
        }
    }
    if let Some(gauge) = POOL_SIZE.get() {
        gauge.record(summary.pool_size as u64, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_run(_summary: &balancer::RunSummary) {}
