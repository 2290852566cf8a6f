/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Integration tests for `POST /auth/verify`.


use axum::body::Body;
use axum::http::StatusCode;
use login_relay_types::{ErrorDetail, VerifyTokenResponse};
use test_helpers::*;
use tower::ServiceExt;

fn verify_request(body: Body) -> axum::http::Request<Body> {
    request("POST", "/auth/verify", None)
        .header("Content-Type", "application/json")
        .body(body)
        .unwrap()
}

fn token_body(token: &str) -> Body {
    Body::from(serde_json::json!({ "id_token": token }).to_string())
}

async fn expect_error(req: axum::http::Request<Body>, status: StatusCode, code: &str) {
    let resp = build_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), status);
    let body: ErrorDetail = response_json(resp).await;
    assert_eq!(body.code, code, "unexpected error body: {body:?}");
}

#[tokio::test]
async fn test_valid_token_is_accepted() {
    let token = sign(tenant_keys(), TEST_KID, &claims_for(TEST_CLIENT_ID));

    let resp = build_app()
        .oneshot(verify_request(token_body(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: VerifyTokenResponse = response_json(resp).await;
    assert_eq!(body.message, "Token verification successful");
}

#[tokio::test]
async fn test_foreign_audience_is_accepted_by_default() {
    let token = sign(tenant_keys(), TEST_KID, &claims_for("some-other-api"));

    let resp = build_app()
        .oneshot(verify_request(token_body(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_foreign_audience_rejected_when_audience_enforced() {
    let mut config = test_config();
    config.verify_audience = true;
    let token = sign(tenant_keys(), TEST_KID, &claims_for("some-other-api"));

    let resp = build_app_with(config)
        .oneshot(verify_request(token_body(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorDetail = response_json(resp).await;
    assert_eq!(body.code, "TOKEN_MALFORMED");
}

#[tokio::test]
async fn test_missing_id_token_field() {
    expect_error(
        verify_request(Body::from("{}")),
        StatusCode::BAD_REQUEST,
        "MISSING_TOKEN",
    )
    .await;
}

#[tokio::test]
async fn test_blank_id_token() {
    expect_error(
        verify_request(token_body("   ")),
        StatusCode::BAD_REQUEST,
        "MISSING_TOKEN",
    )
    .await;
}

#[tokio::test]
async fn test_missing_body() {
    let req = request("POST", "/auth/verify", None)
        .body(Body::empty())
        .unwrap();
    expect_error(req, StatusCode::BAD_REQUEST, "MISSING_TOKEN").await;
}

#[tokio::test]
async fn test_invalid_json_body() {
    expect_error(
        verify_request(Body::from("{not json")),
        StatusCode::BAD_REQUEST,
        "MISSING_TOKEN",
    )
    .await;
}

#[tokio::test]
async fn test_expired_token() {
    let token = sign(tenant_keys(), TEST_KID, &expired_claims());
    let req = verify_request(token_body(&token));

    let resp = build_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorDetail = response_json(resp).await;
    assert_eq!(body.code, "TOKEN_EXPIRED");
    assert_eq!(body.detail, "Token has expired");
}

#[tokio::test]
async fn test_token_signed_by_unpublished_key() {
    let token = sign(stranger_keys(), TEST_KID, &claims_for(TEST_CLIENT_ID));
    expect_error(
        verify_request(token_body(&token)),
        StatusCode::UNAUTHORIZED,
        "SIGNATURE_INVALID",
    )
    .await;
}

#[tokio::test]
async fn test_unknown_kid() {
    let token = sign(tenant_keys(), "retired-kid", &claims_for(TEST_CLIENT_ID));
    expect_error(
        verify_request(token_body(&token)),
        StatusCode::UNAUTHORIZED,
        "KEY_RESOLUTION_FAILED",
    )
    .await;
}

#[tokio::test]
async fn test_garbage_token() {
    expect_error(
        verify_request(token_body("definitely-not-a-jwt")),
        StatusCode::UNAUTHORIZED,
        "TOKEN_MALFORMED",
    )
    .await;
}

#[tokio::test]
async fn test_verify_does_not_create_a_session() {
    let token = sign(tenant_keys(), TEST_KID, &claims_for(TEST_CLIENT_ID));
    let resp = build_app()
        .oneshot(verify_request(token_body(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(set_cookie_for(&resp, "session").is_none());
}
