use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use std::time::Instant;
use uuid::Uuid;

/// Extension type for the per-request correlation id.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Tags every request with a unique id for log correlation and echoes it
/// back in the `X-Request-ID` header.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    request.extensions_mut().insert(RequestId(request_id.clone()));
    tracing::Span::current().record("request_id", request_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("X-Request-ID", value);
    }

    response
}

/// Records request count and latency per route template. Engine-level
/// metrics (assignment outcomes and durations) are recorded by the
/// assignment module itself.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    // Route templates keep metric cardinality bounded; raw paths with uuids
    // in them would explode it.
    let route = request
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let duration = start.elapsed().as_secs_f64();

    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "route" => route,
        "method" => method.to_string()
    )
    .record(duration);

    response
}
