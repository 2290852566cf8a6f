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

//! Application error type that implements Axum's `IntoResponse`.
//!
//! Every error is returned as an [`ErrorDetail`] JSON body
//! (`{ "detail": ..., "code": ... }`) paired with the appropriate status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use login_relay_types::ErrorDetail;

use crate::oauth::{ProviderError, VerifyError};

/// Application-level error that pairs an HTTP status code with an [`ErrorDetail`].
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ErrorDetail,
}

impl AppError {
    pub fn new(status: StatusCode, body: ErrorDetail) -> Self {
        Self { status, body }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorDetail::unauthorized())
    }

    /// 500 with a generic body. The detail is logged, never sent to the client.
    pub fn internal(detail: &str) -> Self {
        tracing::error!("Internal error: {detail}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ErrorDetail::internal_error())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        let status = match err {
            VerifyError::MissingToken => StatusCode::BAD_REQUEST,
            _ => StatusCode::UNAUTHORIZED,
        };
        let body = match err {
            VerifyError::MissingToken => ErrorDetail::missing_token(),
            VerifyError::TokenExpired => ErrorDetail::token_expired(),
            VerifyError::SignatureInvalid => ErrorDetail::signature_invalid(),
            VerifyError::KeyResolutionFailed(_) => ErrorDetail::key_resolution_failed(),
            VerifyError::TokenMalformed(_) => ErrorDetail::token_malformed(),
        };
        Self::new(status, body)
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        Self::internal(&err.to_string())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::internal(&format!("Session store error: {err}"))
    }
}
