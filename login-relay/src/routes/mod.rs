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

//! Axum router configuration for the login relay.

pub mod auth;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Build the application router with all `/auth` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Login flow
        .route("/auth/login", get(auth::login))
        .route(
            "/auth/callback",
            get(auth::callback).post(auth::callback_form),
        )
        .route("/auth/logout", get(auth::logout))
        // Token verification
        .route("/auth/verify", post(auth::verify))
        .route("/auth/getcookie", get(auth::getcookie).post(auth::getcookie))
        // Session introspection
        .route("/auth/session", get(auth::check_session))
        .route("/auth/profile", get(auth::get_profile))
}
