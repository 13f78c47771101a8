use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

use crate::AppState;

pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Set up the Prometheus metrics recorder
pub fn setup_metrics_recorder() -> MetricsState {
    let builder = PrometheusBuilder::new();

    // Latency buckets in seconds, shared by the HTTP middleware histogram
    // and the assignment-duration histogram (whose ceiling is the 10 second
    // deadline).
    let builder = builder
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .expect("failed to set histogram buckets")
        .set_buckets_for_metric(
            Matcher::Full("assignment_duration_seconds".to_string()),
            &[0.001, 0.005, 0.025, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .expect("failed to set histogram buckets");

    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    MetricsState { handle }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = state.metrics.handle.render();
    (StatusCode::OK, metrics)
}
