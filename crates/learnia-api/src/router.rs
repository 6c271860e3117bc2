//! Method/path dispatch over the transport envelope. One transition per
//! request, no state across requests; every branch funnels through a single
//! error boundary.

use serde_json::{Value, json};

use learnia_core::engine::SearchEngine;
use learnia_core::error::{Error, Result};

use crate::cors::OriginPolicy;
use crate::event::HttpEvent;
use crate::handlers;
use crate::response::HttpResponse;

/// Per-process state shared by every invocation.
pub struct ApiState {
    pub engine: SearchEngine,
    pub cors: OriginPolicy,
}

impl ApiState {
    pub fn new(engine: SearchEngine, cors: OriginPolicy) -> Self {
        Self { engine, cors }
    }
}

/// Handle one request envelope end to end. Always produces a response:
/// domain errors render their message with their status and log at warn,
/// anything unexpected logs at error with full detail and renders the fixed
/// generic message.
pub async fn handle(state: &ApiState, event: &HttpEvent) -> HttpResponse {
    let cors = state.cors.headers(event.origin());
    let method = event.method();

    // Preflight bypasses routing, body parsing, and identity entirely.
    if method == "OPTIONS" {
        return HttpResponse::no_content(&cors);
    }

    match route(state, event, &method).await {
        Ok(body) => HttpResponse::json(200, &body, &cors),
        Err(err) if err.is_domain() => {
            tracing::warn!(status = err.status(), error = %err, "request rejected");
            HttpResponse::json(err.status(), &json!({ "error": err.public_message() }), &cors)
        }
        Err(err) => {
            tracing::error!(error = %err, "unexpected error processing request");
            HttpResponse::json(500, &json!({ "error": err.public_message() }), &cors)
        }
    }
}

async fn route(state: &ApiState, event: &HttpEvent, method: &str) -> Result<Value> {
    let path = event.path();
    let engine = &state.engine;

    match (method, path.as_str()) {
        ("POST", "/api/search") => handlers::search(engine, event).await,
        ("GET", "/api/courses/categories") => handlers::categories(engine).await,
        ("GET", "/api/courses/trending") => handlers::trending(engine, event).await,
        ("GET", "/api/favorites") => handlers::favorites(engine, event).await,
        ("GET", "/api/health") => Ok(handlers::health()),
        _ => {
            if method == "GET"
                && let Some(course_id) = course_route(&path)
            {
                return handlers::course(engine, course_id).await;
            }
            if method == "POST"
                && let Some(course_id) = favorite_route(&path)
            {
                return handlers::toggle_favorite(engine, event, course_id).await;
            }
            Err(Error::RouteNotFound(format!(
                "route not found: {method} {path}"
            )))
        }
    }
}

/// `/api/courses/{id}` where `{id}` is non-empty and has no embedded slash.
fn course_route(path: &str) -> Option<&str> {
    let id = path.strip_prefix("/api/courses/")?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// `/api/courses/{id}/favorite` with the same `{id}` constraint.
fn favorite_route(path: &str) -> Option<&str> {
    let id = path
        .strip_prefix("/api/courses/")?
        .strip_suffix("/favorite")?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}
