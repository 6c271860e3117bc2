//! Axum hosting for the Learnia search API.
//!
//! Cross-request concurrency belongs to the runtime; each request is
//! converted into the transport envelope and funneled through the
//! dispatcher, which owns routing, CORS, and the error boundary. The router
//! therefore has a single fallback service and no routes of its own.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use base64::Engine as _;
use tower_http::trace::TraceLayer;

use learnia_api::{ApiState, HttpEvent, HttpResponse, handle};

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the hosted application around the shared dispatcher state.
pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        .fallback(gateway)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Convert one hyper request into an `HttpEvent`, dispatch it, and render
/// the envelope response.
async fn gateway(State(state): State<Arc<ApiState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let headers: HashMap<String, String> = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let query_string_parameters = parts.uri.query().map(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect::<HashMap<_, _>>()
    });

    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return plain_error(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
        }
    };
    let (body, is_base64_encoded) = if bytes.is_empty() {
        (None, false)
    } else {
        match std::str::from_utf8(&bytes) {
            Ok(text) => (Some(text.to_string()), false),
            // Binary bodies are forwarded the way a gateway would: base64-flagged.
            Err(_) => (
                Some(base64::engine::general_purpose::STANDARD.encode(&bytes)),
                true,
            ),
        }
    };

    let event = HttpEvent {
        http_method: Some(parts.method.as_str().to_string()),
        raw_path: Some(parts.uri.path().to_string()),
        query_string_parameters,
        headers: Some(headers),
        body,
        is_base64_encoded,
        ..Default::default()
    };

    render(handle(&state, &event).await)
}

fn render(response: HttpResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
            builder = builder.header(name, value);
        }
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| plain_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error"))
}

fn plain_error(status: StatusCode, message: &str) -> Response {
    let mut response = Response::new(Body::from(format!("{{\"error\":\"{message}\"}}")));
    *response.status_mut() = status;
    response
}
