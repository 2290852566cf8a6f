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

//! Response payloads returned by the relay's JSON endpoints.

use serde::{Deserialize, Serialize};

/// Response payload for a successful `POST /auth/verify`.
///
/// No claims are echoed back; the frontend only learns that the token is good.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VerifyTokenResponse {
    pub message: String,
}

impl VerifyTokenResponse {
    pub const SUCCESS_MESSAGE: &'static str = "Token verification successful";

    pub fn success() -> Self {
        Self {
            message: Self::SUCCESS_MESSAGE.to_string(),
        }
    }
}

/// Response payload for `GET /auth/session`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
}

/// Response payload for `GET /auth/profile`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProfileResponse {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}
