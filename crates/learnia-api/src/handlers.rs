//! One handler per routed operation. Handlers return raw JSON values; the
//! router owns status codes, CORS, and the error boundary.

use serde_json::{Value, json};

use learnia_core::engine::{SearchEngine, SearchRequest};
use learnia_core::error::{Error, Result};
use learnia_core::model::favorite::FavoriteAction;

use crate::event::HttpEvent;

/// POST /api/search
pub async fn search(engine: &SearchEngine, event: &HttpEvent) -> Result<Value> {
    let body = event.json_body(None)?;
    let request: SearchRequest = serde_json::from_value(body)
        .map_err(|e| Error::InvalidBody(format!("malformed search request: {e}")))?;
    let response = engine.search(request).await?;
    Ok(serde_json::to_value(response)?)
}

/// GET /api/courses/categories
pub async fn categories(engine: &SearchEngine) -> Result<Value> {
    let categories = engine.categories().await?;
    Ok(json!({ "categories": categories }))
}

/// GET /api/courses/trending?limit=N
pub async fn trending(engine: &SearchEngine, event: &HttpEvent) -> Result<Value> {
    let limit = event.query_i64("limit", 12)?;
    let courses = engine.trending(limit).await?;
    let total = courses.len();
    Ok(json!({ "courses": courses, "total": total }))
}

/// GET /api/courses/{id}
pub async fn course(engine: &SearchEngine, course_id: &str) -> Result<Value> {
    let course = engine.course(course_id).await?;
    Ok(json!({ "course": course }))
}

/// POST /api/courses/{id}/favorite
pub async fn toggle_favorite(
    engine: &SearchEngine,
    event: &HttpEvent,
    course_id: &str,
) -> Result<Value> {
    let user_id = require_user(event)?;
    let body = event.json_body(Some(json!({})))?;
    let action_raw = match body.get("action") {
        None | Some(Value::Null) => None,
        Some(Value::String(action)) => Some(action.as_str()),
        Some(_) => {
            return Err(Error::InvalidAction(
                "the 'action' parameter must be add, remove, or omitted".to_string(),
            ));
        }
    };
    let action = FavoriteAction::parse(action_raw)?;
    let status = engine.toggle_favorite(&user_id, course_id, action).await?;
    Ok(serde_json::to_value(status)?)
}

/// GET /api/favorites
pub async fn favorites(engine: &SearchEngine, event: &HttpEvent) -> Result<Value> {
    let user_id = require_user(event)?;
    let favorites = engine.favorites(&user_id).await?;
    let total = favorites.len();
    Ok(json!({ "favorites": favorites, "total": total }))
}

/// GET /api/health
pub fn health() -> Value {
    json!({ "status": "ok" })
}

fn require_user(event: &HttpEvent) -> Result<String> {
    event
        .user_id()
        .ok_or_else(|| Error::Unauthenticated("no authenticated user found".to_string()))
}
