use std::io;

use opentelemetry::trace::TracerProvider as TracerProviderTrait;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP client internals are noisy at `info`; keep them at `warn` unless RUST_LOG says otherwise.
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn,h2=warn";

/// Where deployment traces go besides the console.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Full OTLP/HTTP traces URL, e.g. `http://collector:4318/v1/traces`.
    pub otlp_endpoint: Option<String>,
    pub otlp_token: Option<String>,
}

/// Console formatter. Logs go to stderr so stdout carries only progress output.
type ConsoleLayer<S> = tracing_subscriber::fmt::Layer<S, DefaultFields, Format, fn() -> io::Stderr>;

fn console_layer<S>() -> ConsoleLayer<S> {
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr as fn() -> io::Stderr)
}

/// Install the global subscriber.
///
/// Returns the tracer provider when OTLP export is active; the caller keeps it
/// alive for the whole run and calls `shutdown()` so buffered spans are flushed.
/// A broken exporter configuration degrades to console-only logging.
pub fn init_tracing(config: &TelemetryConfig) -> Option<TracerProvider> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = console_layer();

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
        return None;
    };

    let mut headers = std::collections::HashMap::new();
    if let Some(token) = config.otlp_token.as_deref().filter(|t| !t.is_empty()) {
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    }

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .with_headers(headers)
        .build()
    {
        Ok(e) => e,
        Err(err) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
            tracing::warn!(error = %err, "OTLP exporter unavailable, logging to console only");
            return None;
        }
    };

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new([KeyValue::new(
            "service.name",
            config.service_name.clone(),
        )]))
        .build();

    let otel_layer =
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    tracing::debug!(endpoint, service = %config.service_name, "OTLP trace export enabled");
    Some(provider)
}
