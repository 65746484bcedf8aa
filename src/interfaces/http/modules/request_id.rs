//! Request ID middleware
//!
//! Every OCPI request carries an `X-Request-ID` (unique per hop) and an
//! `X-Correlation-ID` (shared by every request belonging to one exchange).
//! Incoming values are reused, missing ones are generated. Both go into the
//! request extensions and a `tracing::Span`, and are echoed on the response.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Extract in handlers: `Extension(RequestId(id)): Extension<RequestId>`
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Correlation id of the OCPI exchange; carried into command callbacks.
#[derive(Clone, Debug)]
pub struct CorrelationId(pub String);

fn header_or_new(request: &Request<Body>, name: &str) -> String {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = header_or_new(&request, REQUEST_ID_HEADER);
    let correlation_id = header_or_new(&request, CORRELATION_ID_HEADER);

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));
    request
        .extensions_mut()
        .insert(CorrelationId(correlation_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        correlation_id = %correlation_id,
        method = %request.method(),
        uri = %request.uri(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    if let Ok(value) = correlation_id.parse() {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}
