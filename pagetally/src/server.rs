//! HTTP routing layer
//!
//! Thin glue mapping verbs and paths onto the core ingest and
//! analytics operations. All JSON responses carry permissive CORS
//! headers; OPTIONS preflights are answered by the CORS layer.
//!
//! Mutating requests lock the store, mutate, persist synchronously
//! and only then respond, so a 201 means the snapshot write was at
//! least attempted and concurrent ingest can never tear the
//! sequences. The snapshot write happens on the tokio worker thread
//! while the mutex is held, blocking the runtime for the duration of
//! one small file write; if the snapshot ever grows large, move the
//! mutate+save into `tokio::task::spawn_blocking`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use pagetally_core::analytics::{self, Statistics, UserJourney, DEFAULT_WINDOW_HOURS};
use pagetally_core::types::{EventInput, PageViewInput, UserInput};
use pagetally_core::{Snapshot, Store};

use crate::dashboard;

/// Store handle shared across request handlers.
pub type SharedStore = Arc<Mutex<Store>>;

/// Build the application router.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(render_dashboard))
        .route("/stats", get(stats))
        .route("/api/track/pageview", post(track_page_view))
        .route("/api/track/event", post(track_event))
        .route("/api/users", post(register_user))
        .route("/api/users/{user_id}/journey", get(user_journey))
        .route("/api/data", get(export_data))
        .route("/api/clear", post(clear))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Lock the store, recovering from a poisoned mutex.
///
/// A handler that panicked mid-mutation leaves at worst one
/// half-applied record; serving the remaining requests beats taking
/// the whole collector down.
fn lock(store: &SharedStore) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Parse the `hours` query parameter.
///
/// Absent or non-numeric values fall back to the 24h default.
fn window_hours(params: &HashMap<String, String>) -> i64 {
    params
        .get("hours")
        .and_then(|h| h.parse().ok())
        .unwrap_or(DEFAULT_WINDOW_HOURS)
}

// ----- read handlers -----

async fn render_dashboard(
    State(store): State<SharedStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<String> {
    let stats = analytics::statistics(&lock(&store), window_hours(&params));
    Html(dashboard::render(&stats))
}

async fn stats(
    State(store): State<SharedStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Statistics> {
    Json(analytics::statistics(&lock(&store), window_hours(&params)))
}

async fn user_journey(
    State(store): State<SharedStore>,
    Path(user_id): Path<String>,
) -> Json<UserJourney> {
    Json(analytics::user_journey(&lock(&store), &user_id))
}

async fn export_data(State(store): State<SharedStore>) -> Json<Snapshot> {
    Json(lock(&store).snapshot().clone())
}

// ----- write handlers -----

async fn track_page_view(
    State(store): State<SharedStore>,
    body: Result<Json<PageViewInput>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(input)) => {
            let stored = pagetally_core::ingest::track_page_view(&mut lock(&store), input);
            created(json!({"success": true, "data": stored}))
        }
        Err(rejection) => bad_request(rejection),
    }
}

async fn track_event(
    State(store): State<SharedStore>,
    body: Result<Json<EventInput>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(input)) => {
            let stored = pagetally_core::ingest::track_event(&mut lock(&store), input);
            created(json!({"success": true, "data": stored}))
        }
        Err(rejection) => bad_request(rejection),
    }
}

async fn register_user(
    State(store): State<SharedStore>,
    body: Result<Json<UserInput>, JsonRejection>,
) -> Response {
    match body {
        Ok(Json(input)) => {
            let stored = pagetally_core::ingest::register_user(&mut lock(&store), input);
            created(json!({"success": true, "data": stored}))
        }
        Err(rejection) => bad_request(rejection),
    }
}

async fn clear(State(store): State<SharedStore>) -> Json<serde_json::Value> {
    lock(&store).clear();
    tracing::info!("Store cleared via API");
    Json(json!({"success": true, "message": "All analytics data cleared"}))
}

// ----- response helpers -----

fn created(body: serde_json::Value) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

/// Malformed or ill-typed JSON body. There is no separate validation
/// error; both collapse to 400 with the parser's message.
fn bad_request(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "error": rejection.body_text()})),
    )
        .into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not Found"}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router(dir: &TempDir) -> Router {
        let store = Arc::new(Mutex::new(Store::open(dir.path().join("analytics.json"))));
        router(store)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, body)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn track_pageview_returns_201_with_stored_record() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            test_router(&dir),
            post_json("/api/track/pageview", r#"{"page":"/home","userId":"u1"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["page"], json!("/home"));
        assert_eq!(body["data"]["userId"], json!("u1"));
        assert_eq!(body["data"]["referrer"], json!(""));
        assert!(!body["data"]["sessionId"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_returns_400_with_parser_message() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            test_router(&dir),
            post_json("/api/track/pageview", "{not json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ill_typed_body_also_returns_400() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(
            test_router(&dir),
            post_json("/api/track/pageview", r#"{"page": 5}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn stats_reflect_tracked_records_and_tolerate_bad_hours() {
        let dir = TempDir::new().unwrap();
        let router = test_router(&dir);

        let (status, _) = send(
            router.clone(),
            post_json("/api/track/pageview", r#"{"page":"/home","userId":"u1"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        send(
            router.clone(),
            post_json("/api/track/event", r#"{"eventName":"signup","userId":"u2"}"#),
        )
        .await;

        // Non-numeric hours falls back to the 24h default
        let (status, body) = send(router, get_req("/stats?hours=abc")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["periodHours"], json!(24));
        assert_eq!(body["totalPageViews"], json!(1));
        assert_eq!(body["totalEvents"], json!(1));
        assert_eq!(body["uniqueUsers"], json!(1));
        assert_eq!(body["pageViews"]["/home"], json!(1));
    }

    #[tokio::test]
    async fn extreme_hours_still_returns_statistics() {
        let dir = TempDir::new().unwrap();
        let router = test_router(&dir);
        send(router.clone(), post_json("/api/track/pageview", "{}")).await;

        let (status, body) = send(router.clone(), get_req("/stats?hours=3000000000")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPageViews"], json!(1));

        let (status, body) = send(router, get_req("/stats?hours=-3000000000")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalPageViews"], json!(0));
    }

    #[tokio::test]
    async fn journey_for_unknown_user_is_200_and_empty() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(test_router(&dir), get_req("/api/users/nobody/journey")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], json!("nobody"));
        assert_eq!(body["totalActions"], json!(0));
        assert_eq!(body["pageViews"], json!([]));
    }

    #[tokio::test]
    async fn data_export_has_snapshot_shape() {
        let dir = TempDir::new().unwrap();
        let router = test_router(&dir);
        send(router.clone(), post_json("/api/track/event", "{}")).await;

        let (status, body) = send(router, get_req("/api/data")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"].as_array().unwrap().len(), 1);
        assert_eq!(body["pageViews"], json!([]));
        assert_eq!(body["users"], json!([]));
        assert_eq!(body["sessions"], json!([]));
    }

    #[tokio::test]
    async fn clear_resets_the_store() {
        let dir = TempDir::new().unwrap();
        let router = test_router(&dir);
        send(router.clone(), post_json("/api/track/pageview", "{}")).await;

        let (status, body) = send(router.clone(), post_json("/api/clear", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));

        let (_, body) = send(router, get_req("/stats")).await;
        assert_eq!(body["totalPageViews"], json!(0));
    }

    #[tokio::test]
    async fn unknown_route_returns_404_json() {
        let dir = TempDir::new().unwrap();
        let (status, body) = send(test_router(&dir), get_req("/api/unknown")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Not Found"));
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/track/pageview")
            .header(header::ORIGIN, "https://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = test_router(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn dashboard_renders_html() {
        let dir = TempDir::new().unwrap();
        let router = test_router(&dir);
        send(
            router.clone(),
            post_json("/api/track/pageview", r#"{"page":"/home"}"#),
        )
        .await;

        let response = router.oneshot(get_req("/?hours=48")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<html"));
        assert!(html.contains("/home"));
        assert!(html.contains("48"));
    }
}
