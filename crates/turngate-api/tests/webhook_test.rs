//! Payment webhook endpoint tests.
//!
//! Covers signature acceptance and rejection paths, the unverified
//! development mode, payload parsing, and the size limit. Signatures are
//! produced by the reference fixture, independent of the production
//! verifier.

use axum::{body::Body, http::StatusCode};
use tower::ServiceExt;
use turngate_testing::{body_json, fixtures::sign_stripe_payload, TestEnv, STRIPE_SECRET, TEST_EPOCH};

const EVENT_PAYLOAD: &str =
    r#"{"id":"evt_1NirvanaTest","object":"event","type":"payment_intent.succeeded","data":{"object":{"id":"pi_123","amount":2000,"currency":"usd"}}}"#;

fn post_webhook(signature: Option<&str>, payload: impl Into<Body>) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder()
        .method("POST")
        .uri("/webhooks/stripe")
        .header("content-type", "application/json");

    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }

    builder.body(payload.into()).unwrap()
}

/// A correctly signed payload is acknowledged with the fixed body the
/// provider expects.
#[tokio::test]
async fn signed_webhook_is_acknowledged() {
    let env = TestEnv::new();
    let signature = sign_stripe_payload(STRIPE_SECRET, TEST_EPOCH, EVENT_PAYLOAD.as_bytes());

    let response =
        env.router().oneshot(post_webhook(Some(&signature), EVENT_PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "received": true }));
}

/// A signature computed over different bytes is rejected.
#[tokio::test]
async fn tampered_payload_is_rejected() {
    let env = TestEnv::new();
    let signature = sign_stripe_payload(STRIPE_SECRET, TEST_EPOCH, EVENT_PAYLOAD.as_bytes());

    let tampered = EVENT_PAYLOAD.replace("2000", "1");
    let response = env.router().oneshot(post_webhook(Some(&signature), tampered)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("signature"));
}

/// A signature with the wrong secret is rejected.
#[tokio::test]
async fn wrong_secret_is_rejected() {
    let env = TestEnv::new();
    let signature = sign_stripe_payload("whsec_other", TEST_EPOCH, EVENT_PAYLOAD.as_bytes());

    let response =
        env.router().oneshot(post_webhook(Some(&signature), EVENT_PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Timestamps outside the tolerance window fail even with a valid digest.
#[tokio::test]
async fn stale_and_future_timestamps_are_rejected() {
    let env = TestEnv::new();

    for timestamp in [TEST_EPOCH - 301, TEST_EPOCH + 301] {
        let signature = sign_stripe_payload(STRIPE_SECRET, timestamp, EVENT_PAYLOAD.as_bytes());
        let response =
            env.router().oneshot(post_webhook(Some(&signature), EVENT_PAYLOAD)).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "timestamp {timestamp} should be outside the tolerance window"
        );
    }
}

/// Timestamps inside the window still verify after clock movement.
#[tokio::test]
async fn timestamp_within_tolerance_is_accepted() {
    let env = TestEnv::new();
    let signature = sign_stripe_payload(STRIPE_SECRET, TEST_EPOCH - 299, EVENT_PAYLOAD.as_bytes());

    let response =
        env.router().oneshot(post_webhook(Some(&signature), EVENT_PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// Headers that do not parse as `t=...,v1=...` are rejected.
#[tokio::test]
async fn malformed_signature_header_is_rejected() {
    let env = TestEnv::new();

    for bad in ["garbage", "t=abc,v1=00", "v1=00", "t=1700000000"] {
        let response =
            env.router().oneshot(post_webhook(Some(bad), EVENT_PAYLOAD)).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "header {bad:?} should be rejected"
        );
    }
}

/// When verification is configured, an unsigned request is rejected.
#[tokio::test]
async fn missing_signature_is_rejected() {
    let env = TestEnv::new();
    let response = env.router().oneshot(post_webhook(None, EVENT_PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "signature header missing");
}

/// An authentic but non-JSON payload is rejected after verification.
#[tokio::test]
async fn non_json_payload_is_rejected() {
    let env = TestEnv::new();
    let payload = "this is not json";
    let signature = sign_stripe_payload(STRIPE_SECRET, TEST_EPOCH, payload.as_bytes());

    let response = env.router().oneshot(post_webhook(Some(&signature), payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "webhook payload is not valid JSON");
}

/// Without a configured secret the receiver accepts unsigned payloads.
#[tokio::test]
async fn unverified_mode_accepts_unsigned_webhooks() {
    let env = TestEnv::without_webhook_secret();
    let response = env.router().oneshot(post_webhook(None, EVENT_PAYLOAD)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "received": true }));
}

/// Oversized payloads are refused before any signature work.
#[tokio::test]
async fn oversized_payload_is_rejected() {
    let env = TestEnv::new();
    let oversized = "x".repeat(1024 * 1024 + 1);

    let response = env.router().oneshot(post_webhook(None, oversized)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
