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

//! OIDC discovery: fetching `.well-known/openid-configuration`.

use serde::Deserialize;

use super::provider::ProviderError;

/// Endpoints discovered from an OIDC provider's `.well-known/openid-configuration`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OidcEndpoints {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

impl OidcEndpoints {
    /// The well-known Auth0 layout for a tenant base URL, used when discovery
    /// is skipped.
    pub fn auth0(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            issuer: format!("{base}/"),
            authorization_endpoint: format!("{base}/authorize"),
            token_endpoint: format!("{base}/oauth/token"),
            jwks_uri: format!("{base}/.well-known/jwks.json"),
            userinfo_endpoint: Some(format!("{base}/userinfo")),
            end_session_endpoint: None,
        }
    }
}

/// Fetch OIDC discovery document from `{issuer}/.well-known/openid-configuration`.
pub async fn discover_oidc_endpoints(
    http: &reqwest::Client,
    issuer: &str,
) -> Result<OidcEndpoints, ProviderError> {
    let url = format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    );
    let resp = http
        .get(&url)
        .send()
        .await
        .map_err(|e| ProviderError::Discovery(format!("request to {url} failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Discovery(format!(
            "HTTP {status} from {url}: {body}"
        )));
    }

    let endpoints = resp
        .json::<OidcEndpoints>()
        .await
        .map_err(|e| ProviderError::Discovery(format!("failed to parse document: {e}")))?;

    tracing::info!(
        issuer = %endpoints.issuer,
        jwks_uri = %endpoints.jwks_uri,
        "Loaded OIDC discovery document"
    );
    Ok(endpoints)
}
