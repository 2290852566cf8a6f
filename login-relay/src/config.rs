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

//! Application configuration loaded from environment variables.
//!
//! The configuration is read once at startup and shared immutably with every
//! handler through [`crate::state::AppState`].

use std::env;
use std::fmt;

use url::Url;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SCOPE: &str = "openid profile email";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_CAPACITY: u64 = 100_000;

/// Configuration for the login relay.
#[derive(Clone)]
pub struct Config {
    /// Address to bind the HTTP server (e.g. "127.0.0.1:3000").
    pub listen_addr: String,
    /// Externally reachable base URL of this service. The provider redirects
    /// back to `{public_url}/auth/callback`.
    pub public_url: Url,
    /// Where the browser lands after a login attempt.
    pub frontend_url: Url,
    /// Where the provider sends the browser after logout.
    pub logout_return_url: Url,
    /// Secret the session cookie signing key is derived from.
    pub session_secret: String,
    pub auth0: Auth0Config,
    /// Cookie domain (optional, e.g. ".example.com").
    pub cookie_domain: Option<String>,
    /// Whether cookies carry `Secure` (and therefore may be `SameSite=None`).
    pub cookie_secure: bool,
    /// Enforce `aud == client_id` on `/auth/verify`. Off by default.
    pub verify_audience: bool,
    /// Timeout applied to every outbound request to the provider.
    pub http_timeout_secs: u64,
    /// Maximum number of server-side sessions kept in memory.
    pub session_capacity: u64,
}

/// Identity provider (Auth0 tenant) settings.
#[derive(Clone)]
pub struct Auth0Config {
    /// Tenant domain, e.g. `my-tenant.eu.auth0.com`. A full `http(s)://` base
    /// URL is also accepted.
    pub domain: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    /// API audience requested at login, if any.
    pub audience: Option<String>,
}

impl Auth0Config {
    /// Base URL of the tenant without a trailing slash.
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }
}

impl fmt::Debug for Auth0Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth0Config")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("public_url", &self.public_url.as_str())
            .field("frontend_url", &self.frontend_url.as_str())
            .field("logout_return_url", &self.logout_return_url.as_str())
            .field("auth0", &self.auth0)
            .field("cookie_domain", &self.cookie_domain)
            .field("cookie_secure", &self.cookie_secure)
            .field("verify_audience", &self.verify_audience)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("session_capacity", &self.session_capacity)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Required
    /// - `AUTH0_DOMAIN`
    /// - `AUTH0_CLIENT_ID`
    /// - `AUTH0_CLIENT_SECRET`
    /// - `APP_SECRET_KEY`
    ///
    /// # Optional
    /// - `FRONTEND_URL` (default: `"http://localhost:3000"`)
    /// - `LOGOUT_RETURN_URL` (default: `FRONTEND_URL`)
    /// - `HOST` (default: `"127.0.0.1"`), `PORT` (default: `"3000"`)
    /// - `PUBLIC_URL` (default: `"http://localhost:{PORT}"`)
    /// - `AUTH0_SCOPE` (default: `"openid profile email"`), `AUTH0_AUDIENCE`
    /// - `COOKIE_DOMAIN`, `COOKIE_SECURE` (default: true iff `PUBLIC_URL` is https)
    /// - `VERIFY_AUDIENCE` (default: `"false"`)
    /// - `HTTP_TIMEOUT_SECS` (default: `"10"`)
    /// - `SESSION_CAPACITY` (default: `"100000"`)
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| format!("{key} environment variable is required"))
        };

        let auth0 = Auth0Config {
            domain: require("AUTH0_DOMAIN")?,
            client_id: require("AUTH0_CLIENT_ID")?,
            client_secret: require("AUTH0_CLIENT_SECRET")?,
            scope: get("AUTH0_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            audience: get("AUTH0_AUDIENCE"),
        };
        let session_secret = require("APP_SECRET_KEY")?;

        let port = match get("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| "PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };
        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let listen_addr = format!("{host}:{port}");

        let public_url = parse_url(
            "PUBLIC_URL",
            &get("PUBLIC_URL").unwrap_or_else(|| format!("http://localhost:{port}")),
        )?;
        let frontend_url = parse_url(
            "FRONTEND_URL",
            &get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
        )?;
        let logout_return_url = match get("LOGOUT_RETURN_URL") {
            Some(u) => parse_url("LOGOUT_RETURN_URL", &u)?,
            None => frontend_url.clone(),
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(v) => parse_bool("COOKIE_SECURE", &v)?,
            None => public_url.scheme() == "https",
        };
        let verify_audience = match get("VERIFY_AUDIENCE") {
            Some(v) => parse_bool("VERIFY_AUDIENCE", &v)?,
            None => false,
        };
        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .map_err(|_| "HTTP_TIMEOUT_SECS must be a valid integer")?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        let session_capacity = match get("SESSION_CAPACITY") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or("SESSION_CAPACITY must be a positive integer")?,
            None => DEFAULT_SESSION_CAPACITY,
        };

        Ok(Self {
            listen_addr,
            public_url,
            frontend_url,
            logout_return_url,
            session_secret,
            auth0,
            cookie_domain: get("COOKIE_DOMAIN"),
            cookie_secure,
            verify_audience,
            http_timeout_secs,
            session_capacity,
        })
    }

    /// The callback URL registered with the provider.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/auth/callback",
            self.public_url.as_str().trim_end_matches('/')
        )
    }

    /// `scheme://host[:port]` of the frontend, as browsers send it in `Origin`.
    pub fn frontend_origin(&self) -> String {
        self.frontend_url.origin().ascii_serialization()
    }

    /// `Secure` cookies are silently dropped by browsers over plain HTTP.
    pub fn cookie_scheme_mismatch(&self) -> bool {
        self.cookie_secure && self.public_url.scheme() != "https"
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, String> {
    Url::parse(value).map_err(|e| format!("{key} must be a valid URL: {e}"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(format!("{key} must be true/false/1/0")),
    }
}
