//! End-to-end dispatch tests over in-memory collaborators.

use std::sync::Arc;

use serde_json::{Value, json};

use learnia_api::{ApiState, HttpEvent, OriginPolicy, handle};
use learnia_core::catalog::InMemoryCatalog;
use learnia_core::embedding::StubEmbedding;
use learnia_core::engine::SearchEngine;
use learnia_core::favorites::InMemoryFavorites;
use learnia_core::model::course::Course;

struct TestApp {
    state: ApiState,
    embedding: Arc<StubEmbedding>,
    favorites: Arc<InMemoryFavorites>,
}

fn seeded_app(origins: &str) -> TestApp {
    let embedding = Arc::new(StubEmbedding::new(4));
    let favorites = Arc::new(InMemoryFavorites::new());
    let catalog = Arc::new(InMemoryCatalog::new());

    catalog.insert(
        Course {
            course_id: "rust-101".to_string(),
            title: "Programación en Rust".to_string(),
            category: Some("Development".to_string()),
            level: Some("Beginner".to_string()),
            price: Some(10.0),
            students_count: Some(1200),
            rating: Some(4.7),
            ..Default::default()
        },
        vec![1.0, 0.0, 0.0, 0.0],
    );
    catalog.insert(
        Course {
            course_id: "sql-201".to_string(),
            title: "SQL avanzado".to_string(),
            category: Some("Data".to_string()),
            level: Some("Advanced".to_string()),
            price: Some(30.0),
            students_count: Some(5000),
            rating: Some(4.2),
            ..Default::default()
        },
        vec![0.0, 1.0, 0.0, 0.0],
    );

    let engine = SearchEngine::new(embedding.clone(), catalog, favorites.clone());
    TestApp {
        state: ApiState::new(engine, OriginPolicy::from_list(origins)),
        embedding,
        favorites,
    }
}

fn event(value: Value) -> HttpEvent {
    serde_json::from_value(value).unwrap()
}

fn body_json(response: &learnia_api::HttpResponse) -> Value {
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test]
async fn test_options_preflight_short_circuits() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({"requestContext": {"http": {"method": "OPTIONS"}}, "rawPath": "/api/anything"})),
    )
    .await;

    assert_eq!(response.status_code, 204);
    assert_eq!(response.body, "");
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
}

#[tokio::test]
async fn test_search_returns_results() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/search",
            "body": json!({"query": "  curso de rust  "}).to_string()
        })),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    assert_eq!(body["query"], "curso de rust");
    assert_eq!(body["total"], body["results"].as_array().unwrap().len());
    assert!(body["results"][0]["score"].is_number());
    assert_eq!(app.embedding.calls(), 1);
}

#[tokio::test]
async fn test_search_accepts_trailing_slash() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/search/",
            "body": json!({"query": "bases de datos"}).to_string()
        })),
    )
    .await;
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_search_short_query_is_rejected_before_embedding() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/search",
            "body": json!({"query": " ab "}).to_string()
        })),
    )
    .await;

    assert_eq!(response.status_code, 400);
    assert!(body_json(&response)["error"].as_str().unwrap().contains("query"));
    assert_eq!(app.embedding.calls(), 0);
}

#[tokio::test]
async fn test_malformed_body_never_reaches_embedding() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/search",
            "body": "{not json"
        })),
    )
    .await;

    assert_eq!(response.status_code, 400);
    assert_eq!(app.embedding.calls(), 0);
}

#[tokio::test]
async fn test_search_filters_narrow_results() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/search",
            "body": json!({
                "query": "cualquier cosa",
                "filters": {"category": "data", "max_price": 30}
            }).to_string()
        })),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["course_id"], "sql-201");
}

#[tokio::test]
async fn test_categories_endpoint() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({"httpMethod": "GET", "rawPath": "/api/courses/categories"})),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert!(categories.iter().all(|c| c["count"] == 1));
}

#[tokio::test]
async fn test_trending_endpoint_sorts_by_students() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({"httpMethod": "GET", "rawPath": "/api/courses/trending"})),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    assert_eq!(body["total"], 2);
    assert_eq!(body["courses"][0]["course_id"], "sql-201");
}

#[tokio::test]
async fn test_trending_rejects_non_numeric_limit() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "httpMethod": "GET",
            "rawPath": "/api/courses/trending",
            "queryStringParameters": {"limit": "lots"}
        })),
    )
    .await;

    assert_eq!(response.status_code, 400);
    assert!(body_json(&response)["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn test_get_course_by_id() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({"httpMethod": "GET", "rawPath": "/api/courses/rust-101"})),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let body = body_json(&response);
    assert_eq!(body["course"]["course_id"], "rust-101");
    // Non-ASCII characters survive to the wire unescaped.
    assert!(response.body.contains("Programación"));
}

#[tokio::test]
async fn test_get_unknown_course_is_404_not_500() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({"httpMethod": "GET", "rawPath": "/api/courses/nope"})),
    )
    .await;

    assert_eq!(response.status_code, 404);
    assert_eq!(body_json(&response)["error"], "course not found");
}

#[tokio::test]
async fn test_favorite_requires_identity() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/courses/rust-101/favorite"
        })),
    )
    .await;

    assert_eq!(response.status_code, 401);
    assert_eq!(app.favorites.row_count(), 0);
}

#[tokio::test]
async fn test_favorite_toggle_inverts_without_action() {
    let app = seeded_app("");
    let toggle = json!({
        "requestContext": {"http": {"method": "POST"}},
        "rawPath": "/api/courses/rust-101/favorite",
        "headers": {"x-user-id": "u1"}
    });

    let first = handle(&app.state, &event(toggle.clone())).await;
    assert_eq!(first.status_code, 200);
    assert_eq!(body_json(&first)["is_favorite"], true);

    let second = handle(&app.state, &event(toggle)).await;
    assert_eq!(body_json(&second)["is_favorite"], false);
    assert_eq!(app.favorites.row_count(), 0);
}

#[tokio::test]
async fn test_favorite_add_action_is_idempotent() {
    let app = seeded_app("");
    let add = json!({
        "requestContext": {
            "http": {"method": "POST"},
            "authorizer": {"claims": {"sub": "claim-user"}}
        },
        "rawPath": "/api/courses/rust-101/favorite",
        "body": json!({"action": "add"}).to_string()
    });

    for _ in 0..2 {
        let response = handle(&app.state, &event(add.clone())).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(body_json(&response)["is_favorite"], true);
    }
    assert_eq!(app.favorites.row_count(), 1);
}

#[tokio::test]
async fn test_favorite_rejects_unknown_action() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/courses/rust-101/favorite",
            "headers": {"user-id": "u1"},
            "body": json!({"action": "delete"}).to_string()
        })),
    )
    .await;

    assert_eq!(response.status_code, 400);
    assert!(body_json(&response)["error"].as_str().unwrap().contains("action"));
}

#[tokio::test]
async fn test_favorites_listing_requires_identity_and_lists() {
    let app = seeded_app("");
    let unauthenticated = handle(
        &app.state,
        &event(json!({"httpMethod": "GET", "rawPath": "/api/favorites"})),
    )
    .await;
    assert_eq!(unauthenticated.status_code, 401);

    handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/courses/rust-101/favorite",
            "headers": {"x-user-id": "u1"},
            "body": json!({"action": "add"}).to_string()
        })),
    )
    .await;

    let listed = handle(
        &app.state,
        &event(json!({
            "httpMethod": "GET",
            "rawPath": "/api/favorites",
            "headers": {"x-user-id": "u1"}
        })),
    )
    .await;
    assert_eq!(listed.status_code, 200);
    let body = body_json(&listed);
    assert_eq!(body["total"], 1);
    assert_eq!(body["favorites"][0]["course_id"], "rust-101");
}

#[tokio::test]
async fn test_unknown_route_names_method_and_path() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({"httpMethod": "DELETE", "rawPath": "/api/foo"})),
    )
    .await;

    assert_eq!(response.status_code, 404);
    let message = body_json(&response)["error"].as_str().unwrap().to_string();
    assert!(message.contains("DELETE"));
    assert!(message.contains("/api/foo"));
}

#[tokio::test]
async fn test_base64_body_is_decoded_before_parsing() {
    use base64::Engine as _;

    let app = seeded_app("");
    let payload = json!({"query": "machine learning"}).to_string();
    let encoded = base64::engine::general_purpose::STANDARD.encode(payload);

    let response = handle(
        &app.state,
        &event(json!({
            "requestContext": {"http": {"method": "POST"}},
            "rawPath": "/api/search",
            "body": encoded,
            "isBase64Encoded": true
        })),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body_json(&response)["query"], "machine learning");
}

#[tokio::test]
async fn test_every_response_carries_cors_headers() {
    let app = seeded_app("https://a.com");
    let response = handle(
        &app.state,
        &event(json!({
            "httpMethod": "GET",
            "rawPath": "/api/unknown",
            "headers": {"Origin": "https://evil.com"}
        })),
    )
    .await;

    assert_eq!(response.status_code, 404);
    assert_eq!(response.headers["Access-Control-Allow-Origin"], "https://a.com");
    assert_eq!(response.headers["Vary"], "Origin");
    assert_eq!(response.headers["Access-Control-Allow-Credentials"], "true");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = seeded_app("");
    let response = handle(
        &app.state,
        &event(json!({"httpMethod": "GET", "rawPath": "/api/health"})),
    )
    .await;
    assert_eq!(response.status_code, 200);
    assert_eq!(body_json(&response)["status"], "ok");
}
