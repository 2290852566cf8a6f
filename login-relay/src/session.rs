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

//! Server-side browser sessions.
//!
//! Session data lives in a bounded in-memory cache; the browser only holds a
//! signed `session` cookie carrying the session id. Records expire after
//! [`SESSION_IDLE_TIMEOUT`] without activity, and the least recently used ones
//! are evicted once `SESSION_CAPACITY` records are stored.

use axum::Router;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_moka_store::MokaStore;

use crate::config::Config;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Sessions idle for longer than this are dropped (14 days).
pub const SESSION_IDLE_TIMEOUT: time::Duration = time::Duration::days(14);

/// Session key holding the [`TokenSet`](crate::oauth::TokenSet) of a logged-in user.
pub const USER_KEY: &str = "user";

/// Session key holding the [`PendingAuthorization`](crate::oauth::PendingAuthorization)
/// between login and callback.
pub const PENDING_KEY: &str = "oauth_pending";

/// Derive the 64-byte cookie signing key from the configured secret.
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// `SameSite=None` needs `Secure`; fall back to `Lax` over plain HTTP.
pub fn same_site(secure: bool) -> SameSite {
    if secure {
        SameSite::None
    } else {
        SameSite::Lax
    }
}

/// Wrap `router` in the session layer.
pub fn with_sessions<S>(router: Router<S>, config: &Config) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let store = MokaStore::new(Some(config.session_capacity));
    let layer = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_expiry(Expiry::OnInactivity(SESSION_IDLE_TIMEOUT))
        .with_http_only(true)
        .with_secure(config.cookie_secure)
        .with_same_site(same_site(config.cookie_secure))
        .with_signed(signing_key(&config.session_secret));

    router.layer(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_key_is_stable_per_secret() {
        assert_eq!(
            signing_key("secret").master(),
            signing_key("secret").master()
        );
        assert_ne!(signing_key("secret").master(), signing_key("other").master());
    }

    #[test]
    fn same_site_relaxes_without_secure() {
        assert_eq!(same_site(true), SameSite::None);
        assert_eq!(same_site(false), SameSite::Lax);
    }
}
