use std::time::Duration;

use inpaint_common::telemetry::TelemetryConfig;
use inpaint_platform::VertexOptions;

use crate::args::Args;

pub fn build_vertex_options(args: &Args) -> VertexOptions {
    VertexOptions {
        api_endpoint: args.api_endpoint.clone().filter(|e| !e.is_empty()),
        // a zero interval would spin on the operations API
        poll_interval: Duration::from_secs(args.poll_interval_secs.max(1)),
    }
}

pub fn build_telemetry_config(args: &Args) -> TelemetryConfig {
    TelemetryConfig {
        service_name: "inpaint-deploy".to_string(),
        otlp_endpoint: args.otlp_endpoint.clone().filter(|e| !e.is_empty()),
        otlp_token: args.otlp_token.clone(),
    }
}
