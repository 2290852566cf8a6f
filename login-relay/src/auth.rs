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

//! Request-side authentication helpers: the logged-in session user and the
//! frontend-readable `token` cookie.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::oauth::TokenSet;
use crate::session::USER_KEY;

/// Name of the cookie carrying the raw ID token for the frontend.
pub const TOKEN_COOKIE: &str = "token";

/// Extractor resolving the token set stored by a successful callback.
///
/// Rejects with 401 when the session has no user.
#[derive(Debug)]
pub struct SessionUser(pub TokenSet);

impl<S: Send + Sync> FromRequestParts<S> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::internal(msg))?;

        match session.get::<TokenSet>(USER_KEY).await? {
            Some(tokens) => Ok(SessionUser(tokens)),
            None => Err(AppError::unauthorized()),
        }
    }
}

/// Value of the `token` cookie, if the request carries a non-empty one.
pub fn token_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("token="))
        .map(str::trim)
        .find(|value| !value.is_empty())
}
