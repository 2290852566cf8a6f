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

//! JWKS (JSON Web Key Set) cache with rate-limited refresh.
//!
//! Auth0 rotates its signing keys; a token carrying an unknown `kid` triggers
//! a refetch of the key set, at most once per refresh interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::verify::VerifyError;

/// Minimum interval between JWKS refreshes (5 minutes).
pub const JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// A JWK entry from the JWKS endpoint.
#[derive(Debug, Deserialize)]
struct JwkEntry {
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    // RSA fields
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    // EC fields
    #[serde(default)]
    crv: Option<String>,
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    y: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkEntry>,
}

/// Caches JWKS keys fetched from the provider, with rate-limited refresh.
pub struct JwksCache {
    http: reqwest::Client,
    keys: RwLock<HashMap<String, (Algorithm, DecodingKey)>>,
    jwks_url: String,
    last_refresh: RwLock<Option<Instant>>,
}

impl JwksCache {
    /// An empty cache; the first lookup fetches `jwks_url`.
    pub fn new(http: reqwest::Client, jwks_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            http,
            keys: RwLock::new(HashMap::new()),
            jwks_url: jwks_url.into(),
            last_refresh: RwLock::new(None),
        })
    }

    /// A cache with pre-loaded keys that never fetches.
    pub fn from_keys(keys: HashMap<String, (Algorithm, DecodingKey)>) -> Arc<Self> {
        Arc::new(Self {
            http: reqwest::Client::new(),
            keys: RwLock::new(keys),
            jwks_url: String::new(),
            last_refresh: RwLock::new(Some(Instant::now())),
        })
    }

    /// Get the decoding key for a given `kid`. Refreshes the cache if the key
    /// is not found (rate-limited to once per [`JWKS_REFRESH_INTERVAL`]).
    pub async fn get_key(&self, kid: &str) -> Result<(Algorithm, DecodingKey), VerifyError> {
        {
            let keys = self.keys.read().await;
            if let Some((alg, key)) = keys.get(kid) {
                return Ok((*alg, key.clone()));
            }
        }

        self.refresh().await?;

        let keys = self.keys.read().await;
        keys.get(kid)
            .map(|(alg, key)| (*alg, key.clone()))
            .ok_or_else(|| VerifyError::KeyResolutionFailed(format!("no JWKS key for kid {kid}")))
    }

    /// Number of keys currently cached.
    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Fetch the JWKS document and replace the cache.
    ///
    /// Attempts are rate-limited whether or not they succeed, so an unreachable
    /// provider is not hit on every unknown `kid`. Concurrent misses wait for
    /// the in-flight attempt instead of fetching again.
    async fn refresh(&self) -> Result<(), VerifyError> {
        if self.jwks_url.is_empty() {
            return Ok(());
        }
        let mut last_refresh = self.last_refresh.write().await;
        if last_refresh.is_some_and(|last| last.elapsed() < JWKS_REFRESH_INTERVAL) {
            return Ok(());
        }
        *last_refresh = Some(Instant::now());

        let new_keys = self.fetch_keys().await?;
        tracing::debug!(count = new_keys.len(), "Refreshed JWKS");
        *self.keys.write().await = new_keys;
        Ok(())
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, (Algorithm, DecodingKey)>, VerifyError> {
        let resp = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| VerifyError::KeyResolutionFailed(format!("JWKS fetch failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            tracing::warn!(%status, "JWKS fetch failed");
            return Err(VerifyError::KeyResolutionFailed(format!(
                "JWKS fetch returned HTTP {status}"
            )));
        }

        let doc: JwksDocument = resp
            .json()
            .await
            .map_err(|e| VerifyError::KeyResolutionFailed(format!("Failed to parse JWKS: {e}")))?;

        let mut keys = HashMap::new();
        for jwk in &doc.keys {
            let Some(kid) = jwk.kid.clone() else {
                continue;
            };
            if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
                continue;
            }
            match decoding_key(jwk) {
                Some(key) => {
                    keys.insert(kid, (jwk_algorithm(jwk), key));
                }
                None => tracing::warn!(kid = %kid, kty = %jwk.kty, "Skipping unusable JWK"),
            }
        }
        Ok(keys)
    }
}

fn decoding_key(jwk: &JwkEntry) -> Option<DecodingKey> {
    match jwk.kty.as_str() {
        "RSA" => {
            let n = jwk.n.as_deref().filter(|s| !s.is_empty())?;
            let e = jwk.e.as_deref().filter(|s| !s.is_empty())?;
            DecodingKey::from_rsa_components(n, e).ok()
        }
        "EC" => {
            let x = jwk.x.as_deref().filter(|s| !s.is_empty())?;
            let y = jwk.y.as_deref().filter(|s| !s.is_empty())?;
            DecodingKey::from_ec_components(x, y).ok()
        }
        _ => None,
    }
}

/// Determine the JWT algorithm for a JWK entry.
fn jwk_algorithm(jwk: &JwkEntry) -> Algorithm {
    if let Some(alg) = &jwk.alg {
        match alg.as_str() {
            "RS384" => return Algorithm::RS384,
            "RS512" => return Algorithm::RS512,
            "ES256" => return Algorithm::ES256,
            "ES384" => return Algorithm::ES384,
            "RS256" => return Algorithm::RS256,
            _ if jwk.kty == "RSA" => return Algorithm::RS256,
            _ => {}
        }
    }
    // Default based on key type.
    match jwk.kty.as_str() {
        "EC" => match jwk.crv.as_deref() {
            Some("P-384") => Algorithm::ES384,
            _ => Algorithm::ES256,
        },
        _ => Algorithm::RS256,
    }
}
