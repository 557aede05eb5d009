//! Integration tests for the request-channel endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. A spawned stub stands in for the host on the
//! receiving end of the command channel.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use marionette_gateway::router::build_request_router;
use marionette_gateway::state::{ApiCommand, GatewayState};
use marionette_types::CommandResult;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Answer every command with the result `answer` produces.
fn spawn_host_stub(
    mut rx: mpsc::Receiver<ApiCommand>,
    answer: fn(&ApiCommand) -> CommandResult,
) {
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            let result = answer(&command);
            if let Some(reply) = command.reply {
                let _ = reply.send(result);
            }
        }
    });
}

fn post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn test_health_never_touches_the_host() {
    // No stub consuming the channel: health must still answer.
    let (state, _rx) = GatewayState::channel();
    let app = build_request_router(state);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("ok"));
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_command_round_trip() {
    let (state, rx) = GatewayState::channel();
    spawn_host_stub(rx, |command| CommandResult::ok(&command.envelope.action));
    let app = build_request_router(state);

    let response = app
        .oneshot(post(r#"{"action":"stopMotion"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("success"));
    assert_eq!(
        json.pointer("/result/action").and_then(Value::as_str),
        Some("stopMotion")
    );
}

#[tokio::test]
async fn test_rejected_command_reports_error() {
    let (state, rx) = GatewayState::channel();
    spawn_host_stub(rx, |_| CommandResult::fail("Unknown action"));
    let app = build_request_router(state);

    let response = app
        .oneshot(post(r#"{"action":"danceBattle"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("error"));
    assert_eq!(
        json.get("message").and_then(Value::as_str),
        Some("Unknown action")
    );
    assert_eq!(
        json.pointer("/result/success").and_then(Value::as_bool),
        Some(false)
    );
}

#[tokio::test]
async fn test_malformed_body_reports_structured_error() {
    let (state, _rx) = GatewayState::channel();
    let app = build_request_router(state);

    let response = app.oneshot(post("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The body keeps the reply contract even on parse failure.
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("error"));
    assert!(json.get("message").is_some());
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_missing_action_is_a_client_error() {
    let (state, _rx) = GatewayState::channel();
    let app = build_request_router(state);

    let response = app.oneshot(post(r#"{"data":{}}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("error"));
}

#[tokio::test]
async fn test_nonexistent_route_returns_structured_404() {
    let (state, _rx) = GatewayState::channel();
    let app = build_request_router(state);

    let response = app
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.get("status").and_then(Value::as_str), Some("error"));
    assert_eq!(
        json.get("message").and_then(Value::as_str),
        Some("Endpoint not found")
    );
}

#[tokio::test]
async fn test_host_gone_is_a_server_error() {
    let (state, rx) = GatewayState::channel();
    drop(rx);
    let app = build_request_router(state);

    let response = app
        .oneshot(post(r#"{"action":"stopMotion"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
