//! Tracing and OpenTelemetry setup for the greenhouse binary.

use anyhow::Result;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_sdk::{
    trace::{Config, RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SERVICE: &str = "greenhouse";

/// Install the global subscriber. Logs go to stderr; stdout is left for
/// snapshot output.
pub fn init_telemetry(otel_endpoint: Option<&str>) -> Result<()> {
    let sampler = match otel_endpoint {
        Some(_) => Sampler::AlwaysOn,
        None => Sampler::AlwaysOff,
    };

    let tracer_provider = TracerProvider::builder()
        .with_config(
            Config::default()
                .with_sampler(sampler)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new(SERVICE_NAME, SERVICE),
                    KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    global::set_tracer_provider(tracer_provider.clone());

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer(SERVICE));

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,greenhouse_session=debug,greenhouse_world=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(telemetry_layer)
        .try_init()?;

    match otel_endpoint {
        Some(endpoint) => info!(endpoint, "Telemetry initialized with OpenTelemetry tracing"),
        None => info!("Telemetry initialized (OpenTelemetry disabled)"),
    }
    Ok(())
}

pub fn shutdown_telemetry() {
    info!("Shutting down telemetry");
    global::shutdown_tracer_provider();
}

/// Record a counter metric as a structured event
#[macro_export]
macro_rules! record_counter {
    ($name:expr, $value:expr) => {
        ::tracing::info!(counter_name = $name, counter_value = $value, "Counter metric")
    };
    ($name:expr, $value:expr, $($key:ident = $val:expr),+ $(,)?) => {
        ::tracing::info!(
            counter_name = $name,
            counter_value = $value,
            $($key = $val,)+
            "Counter metric"
        )
    };
}

/// Record a gauge metric as a structured event
#[macro_export]
macro_rules! record_gauge {
    ($name:expr, $value:expr) => {
        ::tracing::info!(gauge_name = $name, gauge_value = $value, "Gauge metric")
    };
    ($name:expr, $value:expr, $($key:ident = $val:expr),+ $(,)?) => {
        ::tracing::info!(
            gauge_name = $name,
            gauge_value = $value,
            $($key = $val,)+
            "Gauge metric"
        )
    };
}
