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

//! Shared application state passed to every Axum handler via `State`.

use std::sync::Arc;

use crate::config::Config;
use crate::oauth::{IdentityProvider, TokenVerifier};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup.
    pub config: Arc<Config>,
    /// Authorization redirects, code exchange and logout URLs.
    pub provider: Arc<dyn IdentityProvider>,
    /// Verifies tokens posted to `/auth/verify`.
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            verifier,
        }
    }
}
