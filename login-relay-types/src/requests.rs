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

//! Request bodies accepted by the relay.

use serde::{Deserialize, Serialize};

/// Request body for `POST /auth/verify`.
///
/// `id_token` is optional at the type level so that an absent field is
/// reported as a missing token rather than a deserialization failure.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct VerifyTokenRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

impl VerifyTokenRequest {
    pub fn new(id_token: impl Into<String>) -> Self {
        Self {
            id_token: Some(id_token.into()),
        }
    }

    /// The token, if present and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.id_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
