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

//! Login relay library.
//!
//! This crate provides the Axum router, application state, and configuration
//! for a small service that runs the OAuth2 authorization-code flow against
//! Auth0 on behalf of a single-page frontend, keeps the resulting tokens in a
//! server-side session, and verifies ID tokens the frontend posts back. The
//! binary entry point (`main.rs`) is a thin wrapper that calls into this
//! library.

pub mod auth;
pub mod config;
pub mod error;
pub mod oauth;
pub mod routes;
pub mod session;
pub mod state;

use axum::{http::HeaderValue, Router};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::state::AppState;

/// Local development origins always allowed by CORS.
pub const DEV_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8000",
    "http://localhost:8000",
];

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "login_relay=info,tower_http=info";

/// Build the complete application: routes, sessions, CORS and request tracing.
pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();
    let router = session::with_sessions(routes::router(), &config);

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
}

/// Origins allowed to call the relay with credentials.
pub fn allowed_origins(config: &Config) -> Vec<String> {
    let mut origins: Vec<String> = DEV_ORIGINS.iter().map(|o| o.to_string()).collect();
    let frontend = config.frontend_origin();
    if !origins.contains(&frontend) {
        origins.push(frontend);
    }
    origins
}

/// Credentialed CORS for the known origins. Methods and headers are mirrored,
/// since wildcards are not allowed together with credentials.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins(config)
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {o}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides
/// [`DEFAULT_LOG_FILTER`].
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
