//! End-to-end HTTP facade tests against an in-memory `BrowserDriver`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pagepool_api::{build_router, AppState};
use pagepool_driver::MemoryDriver;
use pagepool_pool::PoolAdmin;
use pagepool_types::ServiceConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> axum::Router {
    let config = ServiceConfig {
        browser_pool_max_size: 2,
        rate_limit_requests: 1_000,
        ..ServiceConfig::default()
    };
    let driver = Arc::new(MemoryDriver::default());
    let admin = Arc::new(PoolAdmin::new(driver, config.clone()));
    build_router(AppState::new(admin, config))
}

async fn call(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// S1: create pool, open a session, dispatch an action, close it.
#[tokio::test]
async fn happy_path_create_pool_session_action_close() {
    let app = test_app();

    let (status, body) = call(&app, json_request("POST", "/api/v1/browser-pools", json!({"headless": true}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let pool_id = body["pool_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Request::builder()
            .method("GET")
            .uri(format!("/api/v1/sessions/new?pool_id={pool_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(session_id.split('_').count(), 3);

    let (status, body) = call(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/sessions/action/{session_id}"),
            json!({"action": "goto", "url": "https://example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://example.com");

    let (status, _) = call(
        &app,
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/v1/sessions/close/{session_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// The returnPageContents cross-cutting option must be readable over the
// wire as camelCase, matching every other action param (waitForText, etc).
#[tokio::test]
async fn return_page_contents_is_read_as_camel_case() {
    let app = test_app();

    let (_, body) = call(&app, json_request("POST", "/api/v1/browser-pools", json!({}))).await;
    let pool_id = body["pool_id"].as_str().unwrap().to_string();

    let (_, body) = call(
        &app,
        Request::builder()
            .method("GET")
            .uri(format!("/api/v1/sessions/new?pool_id={pool_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/sessions/action/{session_id}"),
            json!({"action": "goto", "url": "https://example.com", "returnPageContents": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["pageContents"].as_str().unwrap().contains("https://example.com"));
    assert_eq!(body["result"]["url"], "https://example.com");
}

// S2: creating the same pool config twice collides on PoolId.
#[tokio::test]
async fn duplicate_pool_config_is_rejected() {
    let app = test_app();
    let config = json!({"headless": true, "browser": "chrome"});

    let (status, _) = call(&app, json_request("POST", "/api/v1/browser-pools", config.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, json_request("POST", "/api/v1/browser-pools", config)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "pool_already_exists");
}

// S3: capacity exhaustion surfaces as 500 on explicit create_browser via
// scale-up (pool_capacity_reached has no dedicated entry in the status
// table and falls under the "otherwise" rule).
#[tokio::test]
async fn scale_up_past_capacity_is_rejected() {
    let app = test_app();
    let (_, body) = call(&app, json_request("POST", "/api/v1/browser-pools", json!({}))).await;
    let pool_id = body["pool_id"].as_str().unwrap().to_string();

    // browser_pool_max_size is 2 in test_app().
    let (status, _) = call(
        &app,
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/v1/browser-pools/{pool_id}/scale-up"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/v1/browser-pools/{pool_id}/scale-up"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Request::builder()
            .method("PATCH")
            .uri(format!("/api/v1/browser-pools/{pool_id}/scale-up"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "pool_capacity_reached");
}

// S4: graceful deletion marks inactive and rejects new sessions immediately.
#[tokio::test]
async fn graceful_delete_rejects_new_sessions() {
    let app = test_app();
    let (_, body) = call(&app, json_request("POST", "/api/v1/browser-pools", json!({}))).await;
    let pool_id = body["pool_id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/browser-pools/{pool_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(
        &app,
        Request::builder()
            .method("GET")
            .uri(format!("/api/v1/sessions/new?pool_id={pool_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["type"], "pool_inactive");
}

// S5: resolving an unknown session id is a 404, and a malformed id is a 400.
#[tokio::test]
async fn unknown_and_malformed_session_ids() {
    let app = test_app();

    let (status, body) = call(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/v1/sessions/not_enough")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_session_id");

    let (status, body) = call(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/v1/sessions/aaa_bbb_7")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "page_session_not_found");
}

// S6: pop-and-replace discipline - a session's page is unavailable while
// an action against it is mid-flight (simulated by popping twice in a row
// without a put-back in between).
#[tokio::test]
async fn concurrent_resolution_is_rejected_while_popped() {
    let config = ServiceConfig {
        rate_limit_requests: 1_000,
        ..ServiceConfig::default()
    };
    let driver = Arc::new(MemoryDriver::default());
    let admin = Arc::new(PoolAdmin::new(driver, config.clone()));

    let pool_id = admin.create_pool(Default::default()).await.unwrap();
    let session_id = admin.new_session(pool_id.as_str()).await.unwrap();

    let (_, session) = admin.take_page_session(&session_id).await.unwrap();
    let second = admin.take_page_session(&session_id).await;
    assert!(matches!(second, Err(pagepool_types::PoolError::PageSessionNotFound { .. })));

    admin.put_page_session(&session_id, session).await.unwrap();
    assert!(admin.take_page_session(&session_id).await.is_ok());
}

#[tokio::test]
async fn healthz_and_listing_actions() {
    let app = test_app();

    let (status, _) = call(&app, Request::builder().method("GET").uri("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/v1/sessions/actions")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["actions"].as_array().unwrap().iter().any(|a| a == "goto"));
}
