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

//! The identity provider seam used by the login, callback and logout handlers.

use std::sync::Arc;

use async_trait::async_trait;
use oauth2::{CsrfToken, PkceCodeChallenge};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::claims::IdTokenClaims;
use super::discovery::{discover_oidc_endpoints, OidcEndpoints};
use super::exchange::{build_auth_url, request_tokens, AuthUrlParams};
use super::jwks::JwksCache;
use super::verify::{JwksVerifier, TokenVerifier, VerificationPolicy, VerifyError};
use crate::config::Auth0Config;

/// Lifetime of a pending authorization (10 minutes).
pub const PENDING_AUTHORIZATION_MAX_AGE_SECS: i64 = 600;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("OIDC discovery failed: {0}")]
    Discovery(String),

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("token response did not include an id_token")]
    MissingIdToken,

    #[error("id_token rejected: {0}")]
    IdToken(#[from] VerifyError),

    #[error("HTTP request to provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// What the login step remembers for the callback to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub state: String,
    pub nonce: String,
    pub code_verifier: String,
    pub redirect_uri: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl PendingAuthorization {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() - self.created_at > PENDING_AUTHORIZATION_MAX_AGE_SECS
    }
}

/// Where to send the browser, and what to remember until it comes back.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    pub url: String,
    pub pending: PendingAuthorization,
}

/// Tokens stored in the session after a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub id_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Unix seconds, computed from `expires_in` at exchange time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub userinfo: IdTokenClaims,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the provider authorize URL together with fresh state, nonce and
    /// PKCE verifier.
    fn build_authorization_redirect(
        &self,
        redirect_uri: &str,
    ) -> Result<AuthorizationRedirect, ProviderError>;

    /// Redeem an authorization code. The returned ID token has been verified
    /// against `pending.nonce`.
    async fn exchange_code(
        &self,
        pending: &PendingAuthorization,
        code: &str,
    ) -> Result<TokenSet, ProviderError>;

    /// Provider logout URL that sends the browser on to `return_to`.
    fn logout_redirect(&self, return_to: &str) -> Result<String, ProviderError>;
}

/// [`IdentityProvider`] for an Auth0 tenant (or any OIDC provider exposing the
/// same endpoints).
pub struct OidcProvider {
    http: reqwest::Client,
    settings: Auth0Config,
    endpoints: OidcEndpoints,
    jwks: Arc<JwksCache>,
    id_token_verifier: JwksVerifier,
}

impl OidcProvider {
    /// Load endpoints from the tenant's discovery document.
    pub async fn discover(
        http: reqwest::Client,
        settings: &Auth0Config,
    ) -> Result<Self, ProviderError> {
        let endpoints = discover_oidc_endpoints(&http, &settings.base_url()).await?;
        Ok(Self::with_endpoints(http, settings, endpoints))
    }

    pub fn with_endpoints(
        http: reqwest::Client,
        settings: &Auth0Config,
        endpoints: OidcEndpoints,
    ) -> Self {
        let jwks = JwksCache::new(http.clone(), endpoints.jwks_uri.clone());
        let policy = VerificationPolicy::default()
            .with_audience(settings.client_id.clone())
            .with_issuer(endpoints.issuer.clone());
        Self {
            id_token_verifier: JwksVerifier::new(jwks.clone(), policy),
            http,
            settings: settings.clone(),
            endpoints,
            jwks,
        }
    }

    /// The key cache used for ID tokens, shared with `/auth/verify`.
    pub fn jwks(&self) -> Arc<JwksCache> {
        self.jwks.clone()
    }
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    fn build_authorization_redirect(
        &self,
        redirect_uri: &str,
    ) -> Result<AuthorizationRedirect, ProviderError> {
        let state = CsrfToken::new_random();
        let nonce = CsrfToken::new_random();
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let url = build_auth_url(
            &self.endpoints.authorization_endpoint,
            &AuthUrlParams {
                client_id: &self.settings.client_id,
                redirect_uri,
                scope: &self.settings.scope,
                code_challenge: pkce_challenge.as_str(),
                state: state.secret(),
                nonce: nonce.secret(),
                audience: self.settings.audience.as_deref(),
            },
        )?;

        Ok(AuthorizationRedirect {
            url,
            pending: PendingAuthorization {
                state: state.secret().clone(),
                nonce: nonce.secret().clone(),
                code_verifier: pkce_verifier.secret().clone(),
                redirect_uri: redirect_uri.to_string(),
                created_at: chrono::Utc::now().timestamp(),
            },
        })
    }

    async fn exchange_code(
        &self,
        pending: &PendingAuthorization,
        code: &str,
    ) -> Result<TokenSet, ProviderError> {
        let response = request_tokens(
            &self.http,
            &self.endpoints.token_endpoint,
            &self.settings.client_id,
            &self.settings.client_secret,
            &pending.redirect_uri,
            &pending.code_verifier,
            code,
        )
        .await?;

        let id_token = response.id_token.ok_or(ProviderError::MissingIdToken)?;
        let claims = self.id_token_verifier.verify_token(&id_token).await?;

        if claims.nonce.as_deref() != Some(pending.nonce.as_str()) {
            return Err(VerifyError::TokenMalformed("nonce mismatch".into()).into());
        }

        tracing::info!(sub = %claims.sub, "OAuth code exchange succeeded");

        let expires_at = response
            .expires_in
            .map(|secs| chrono::Utc::now().timestamp() + secs as i64);

        Ok(TokenSet {
            access_token: response.access_token,
            id_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            expires_at,
            scope: response.scope,
            refresh_token: response.refresh_token,
            userinfo: claims,
        })
    }

    fn logout_redirect(&self, return_to: &str) -> Result<String, ProviderError> {
        let mut url = Url::parse(&format!("{}/v2/logout", self.settings.base_url()))?;
        url.query_pairs_mut()
            .append_pair("returnTo", return_to)
            .append_pair("client_id", &self.settings.client_id);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use rsa::pkcs8::EncodePrivateKey;
    use rsa::traits::PublicKeyParts;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const KID: &str = "tenant-key";
    const CLIENT_ID: &str = "client-123";

    struct TestKey {
        encoding: EncodingKey,
        jwk: serde_json::Value,
    }

    fn test_key() -> &'static TestKey {
        static KEY: OnceLock<TestKey> = OnceLock::new();
        KEY.get_or_init(|| {
            let mut rng = rand::thread_rng();
            let private_key = rsa::RsaPrivateKey::new(&mut rng, 2048).unwrap();
            let pem = private_key
                .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
                .unwrap();
            let public = private_key.to_public_key();
            TestKey {
                encoding: EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap(),
                jwk: serde_json::json!({
                    "kid": KID,
                    "kty": "RSA",
                    "alg": "RS256",
                    "use": "sig",
                    "n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
                    "e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
                }),
            }
        })
    }

    fn settings(domain: &str) -> Auth0Config {
        Auth0Config {
            domain: domain.to_string(),
            client_id: CLIENT_ID.to_string(),
            client_secret: "shh".to_string(),
            scope: "openid profile email".to_string(),
            audience: None,
        }
    }

    fn id_token(issuer: &str, nonce: &str) -> String {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = IdTokenClaims {
            sub: "auth0|user-1".to_string(),
            email: Some("user@example.com".to_string()),
            name: "Test User".to_string(),
            nonce: Some(nonce.to_string()),
            iss: Some(issuer.to_string()),
            aud: Some(serde_json::Value::String(CLIENT_ID.to_string())),
            exp: Some(now + 3600),
            iat: Some(now),
            ..Default::default()
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(KID.to_string());
        encode(&header, &claims, &test_key().encoding).unwrap()
    }

    fn pending(nonce: &str) -> PendingAuthorization {
        PendingAuthorization {
            state: "state-1".to_string(),
            nonce: nonce.to_string(),
            code_verifier: "verifier-1".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// A mock tenant. `id_token` receives the tenant issuer and returns the
    /// ID token its token endpoint should hand out, if any.
    async fn tenant<F>(id_token: F) -> (MockServer, OidcProvider)
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "keys": [test_key().jwk.clone()] })),
            )
            .mount(&server)
            .await;

        let mut body = serde_json::json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "expires_in": 86400,
        });
        if let Some(token) = id_token(&format!("{}/", server.uri())) {
            body["id_token"] = serde_json::Value::String(token);
        }
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("code_verifier=verifier-1"))
            .and(body_string_contains("code=code-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let provider = OidcProvider::with_endpoints(
            reqwest::Client::new(),
            &settings(&server.uri()),
            OidcEndpoints::auth0(&server.uri()),
        );
        (server, provider)
    }

    #[test]
    fn redirect_carries_fresh_state_nonce_and_pkce() {
        let provider = OidcProvider::with_endpoints(
            reqwest::Client::new(),
            &settings("tenant.auth0.com"),
            OidcEndpoints::auth0("https://tenant.auth0.com"),
        );
        let first = provider
            .build_authorization_redirect("http://localhost:3000/auth/callback")
            .unwrap();
        let second = provider
            .build_authorization_redirect("http://localhost:3000/auth/callback")
            .unwrap();

        let url = Url::parse(&first.url).unwrap();
        assert_eq!(url.host_str(), Some("tenant.auth0.com"));
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], CLIENT_ID);
        assert_eq!(query["state"], first.pending.state);
        assert_eq!(query["nonce"], first.pending.nonce);
        assert_eq!(query["code_challenge_method"], "S256");
        assert_ne!(query["code_challenge"], first.pending.code_verifier);

        assert_ne!(first.pending.state, second.pending.state);
        assert_ne!(first.pending.nonce, second.pending.nonce);
        assert!(!first.pending.is_expired());
    }

    #[test]
    fn pending_authorization_expires_after_ten_minutes() {
        let mut p = pending("n");
        p.created_at -= PENDING_AUTHORIZATION_MAX_AGE_SECS + 1;
        assert!(p.is_expired());
    }

    #[test]
    fn logout_redirect_targets_v2_logout() {
        let provider = OidcProvider::with_endpoints(
            reqwest::Client::new(),
            &settings("tenant.auth0.com"),
            OidcEndpoints::auth0("https://tenant.auth0.com"),
        );
        let url = provider
            .logout_redirect("http://localhost:3000/")
            .unwrap();
        assert_eq!(
            url,
            "https://tenant.auth0.com/v2/logout?returnTo=http%3A%2F%2Flocalhost%3A3000%2F&client_id=client-123"
        );
    }

    #[tokio::test]
    async fn exchange_verifies_id_token_and_builds_token_set() {
        let (_server, provider) = tenant(|issuer| Some(id_token(issuer, "nonce-1"))).await;

        let tokens = provider
            .exchange_code(&pending("nonce-1"), "code-1")
            .await
            .expect("exchange should succeed");
        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.userinfo.sub, "auth0|user-1");
        assert_eq!(tokens.userinfo.email.as_deref(), Some("user@example.com"));
        assert!(tokens.expires_at.is_some());
    }

    #[tokio::test]
    async fn exchange_rejects_nonce_mismatch() {
        let (_server, provider) = tenant(|issuer| Some(id_token(issuer, "someone-else"))).await;
        let err = provider
            .exchange_code(&pending("nonce-1"), "code-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::IdToken(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn exchange_rejects_foreign_issuer() {
        let (_server, provider) =
            tenant(|_| Some(id_token("https://evil.example.com/", "nonce-1"))).await;
        let err = provider
            .exchange_code(&pending("nonce-1"), "code-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::IdToken(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn exchange_without_id_token_fails() {
        let (_server, provider) = tenant(|_| None).await;
        let err = provider
            .exchange_code(&pending("nonce-1"), "code-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingIdToken), "got {err:?}");
    }
}
