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

//! ID token claims.

use serde::{Deserialize, Serialize};

/// Claims decoded from an Auth0 ID token JWT.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct IdTokenClaims {
    /// Stable subject identifier, e.g. `auth0|64f...`.
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Standard OIDC `aud`: either a single string or an array. Validation is
    /// done by `jsonwebtoken`; this keeps the raw value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Issued-at time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl IdTokenClaims {
    /// Return a display name, coalescing `name`, `given_name + family_name`,
    /// `nickname`, or email.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match (&self.given_name, &self.family_name) {
            (Some(g), Some(f)) if !g.is_empty() => format!("{g} {f}"),
            (Some(g), _) if !g.is_empty() => g.clone(),
            _ => self
                .nickname
                .clone()
                .filter(|n| !n.is_empty())
                .or_else(|| self.email.clone())
                .unwrap_or_default(),
        }
    }
}
