//! Middleware module for Stash serve crate

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Header carrying the server-side handling time in milliseconds
pub const RESPONSE_TIME_HEADER: &str = "x-response-time-ms";

/// Timing middleware: logs request duration and exposes it as a header
pub async fn timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let mut response = next.run(request).await;

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms,
        "Request completed"
    );

    if let Ok(value) = format!("{:.2}", duration_ms).parse() {
        response.headers_mut().insert(RESPONSE_TIME_HEADER, value);
    }

    response
}
