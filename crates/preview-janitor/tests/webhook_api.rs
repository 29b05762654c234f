//! Integration tests for the webhook receiver endpoint.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{sign, TestJanitor, TEST_SECRET};
use preview_janitor::ProtectionFlag;
use tower::ServiceExt;

fn closed_payload(branch: &str) -> Vec<u8> {
    format!(
        r#"{{"action": "closed", "pull_request": {{"head": {{"ref": "{branch}"}}}}}}"#
    )
    .into_bytes()
}

fn webhook_request(body: Vec<u8>, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhooks/github")
        .header("content-type", "application/json")
        .header("x-github-event", "pull_request")
        .header("x-github-delivery", "delivery-123")
        .header("x-hub-signature-256", signature)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn closed_pull_request_deletes_deployment() {
    let janitor = TestJanitor::new();
    janitor.provider.insert("preview-pr-fix-typo", ProtectionFlag::Unset);

    let body = closed_payload("fix-typo");
    let signature = sign(TEST_SECRET, &body);

    let response = janitor
        .app()
        .oneshot(webhook_request(body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!janitor.provider.contains("preview-pr-fix-typo"));
}

#[tokio::test]
async fn invalid_signature_is_rejected_before_any_provider_call() {
    let janitor = TestJanitor::new();
    janitor.provider.insert("preview-pr-fix-typo", ProtectionFlag::Unset);

    let body = closed_payload("fix-typo");
    let signature = sign("wrong-secret", &body);

    let response = janitor
        .app()
        .oneshot(webhook_request(body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(janitor.provider.contains("preview-pr-fix-typo"));
    assert_eq!(janitor.provider.destructive_calls(), 0);
}

#[tokio::test]
async fn missing_signature_is_unauthorized() {
    let janitor = TestJanitor::new();

    let response = janitor
        .app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/github")
                .header("x-github-event", "pull_request")
                .body(Body::from(closed_payload("fix-typo")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn payload_without_head_branch_is_a_validation_error() {
    let janitor = TestJanitor::new();
    janitor.provider.insert("preview-pr-fix-typo", ProtectionFlag::Unset);

    let body = br#"{"action": "closed"}"#.to_vec();
    let signature = sign(TEST_SECRET, &body);

    let response = janitor
        .app()
        .oneshot(webhook_request(body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(janitor.provider.destructive_calls(), 0);
}

#[tokio::test]
async fn ping_event_is_acknowledged_without_action() {
    let janitor = TestJanitor::new();
    janitor.provider.insert("preview-pr-fix-typo", ProtectionFlag::Unset);

    let body = br#"{"zen": "Keep it logically awesome."}"#.to_vec();
    let signature = sign(TEST_SECRET, &body);

    let response = janitor
        .app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/github")
                .header("x-github-event", "ping")
                .header("x-hub-signature-256", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(janitor.provider.contains("preview-pr-fix-typo"));
}

#[tokio::test]
async fn closing_against_long_lived_branch_never_deletes() {
    let janitor = TestJanitor::new();
    janitor.provider.insert("preview-pr-master", ProtectionFlag::Unset);

    let body = closed_payload("master");
    let signature = sign(TEST_SECRET, &body);

    let response = janitor
        .app()
        .oneshot(webhook_request(body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(janitor.provider.contains("preview-pr-master"));
    assert_eq!(janitor.provider.destructive_calls(), 0);
}

#[tokio::test]
async fn redelivered_webhook_is_idempotent() {
    let janitor = TestJanitor::new();
    janitor.provider.insert("preview-pr-fix-typo", ProtectionFlag::Unset);

    let body = closed_payload("fix-typo");
    let signature = sign(TEST_SECRET, &body);

    for _ in 0..2 {
        let response = janitor
            .app()
            .oneshot(webhook_request(body.clone(), &signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(janitor.provider.destructive_calls(), 1);
}
