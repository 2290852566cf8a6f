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

//! Auth URL construction and authorization code → token exchange.

use serde::Deserialize;
use url::Url;

use super::provider::ProviderError;

/// Query parameters for the provider's authorization endpoint.
#[derive(Debug, Clone)]
pub struct AuthUrlParams<'a> {
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub scope: &'a str,
    pub code_challenge: &'a str,
    pub state: &'a str,
    pub nonce: &'a str,
    pub audience: Option<&'a str>,
}

/// Raw response from the OAuth token endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Build an OAuth2 authorization URL with PKCE (S256) and nonce.
///
/// Parameters are properly URL-encoded. `audience` is appended only when set.
pub fn build_auth_url(auth_url: &str, params: &AuthUrlParams<'_>) -> Result<String, ProviderError> {
    let mut url = Url::parse(auth_url)?;

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("response_type", "code");
        pairs.append_pair("client_id", params.client_id);
        pairs.append_pair("redirect_uri", params.redirect_uri);
        pairs.append_pair("scope", params.scope);
        pairs.append_pair("state", params.state);
        pairs.append_pair("nonce", params.nonce);
        pairs.append_pair("code_challenge", params.code_challenge);
        pairs.append_pair("code_challenge_method", "S256");

        if let Some(aud) = params.audience {
            pairs.append_pair("audience", aud);
        }
    }

    Ok(url.to_string())
}

/// POST the authorization code to the token endpoint (`client_secret_post`).
pub async fn request_tokens(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
    code_verifier: &str,
    authorization_code: &str,
) -> Result<OAuthTokenResponse, ProviderError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("code", authorization_code),
        ("code_verifier", code_verifier),
    ];

    let response = http.post(token_url).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!("OAuth token request failed. Status: {status}, Body: {body}");
        return Err(ProviderError::Exchange(format!(
            "token endpoint returned HTTP {status}"
        )));
    }

    let body_text = response.text().await?;
    serde_json::from_str(&body_text)
        .map_err(|e| ProviderError::Exchange(format!("Failed to parse token response: {e}")))
}
