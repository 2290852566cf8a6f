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

//! API error body.
//!
//! Every failed JSON response is `{ "detail": "...", "code": "..." }`.

use serde::{Deserialize, Serialize};

/// Structured error returned by the relay's JSON endpoints.
///
/// `detail` is the human-readable reason shown to the frontend. `code` is a
/// stable machine-readable identifier (e.g. `"TOKEN_EXPIRED"`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
    pub code: String,
}

impl ErrorDetail {
    pub fn new(code: &str, detail: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            detail: detail.into(),
        }
    }

    pub fn missing_token() -> Self {
        Self::new("MISSING_TOKEN", "Token is missing")
    }

    pub fn token_expired() -> Self {
        Self::new("TOKEN_EXPIRED", "Token has expired")
    }

    pub fn signature_invalid() -> Self {
        Self::new("SIGNATURE_INVALID", "Token signature is invalid")
    }

    pub fn key_resolution_failed() -> Self {
        Self::new("KEY_RESOLUTION_FAILED", "Unable to resolve signing key")
    }

    pub fn token_malformed() -> Self {
        Self::new("TOKEN_MALFORMED", "Token is invalid")
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Not authenticated")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.detail)
    }
}

impl std::error::Error for ErrorDetail {}
