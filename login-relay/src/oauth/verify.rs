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

//! JWT signature verification against the provider's published keys.
//!
//! [`TokenVerifier`] is the seam handlers depend on; [`JwksVerifier`] is the
//! production implementation backed by [`JwksCache`].

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::claims::IdTokenClaims;
use super::jwks::JwksCache;

/// Why a token was rejected.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token is missing")]
    MissingToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("signing key could not be resolved: {0}")]
    KeyResolutionFailed(String),

    #[error("token is malformed: {0}")]
    TokenMalformed(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => VerifyError::TokenExpired,
            ErrorKind::InvalidSignature => VerifyError::SignatureInvalid,
            _ => VerifyError::TokenMalformed(e.to_string()),
        }
    }
}

/// Which claims, besides signature and `exp`, a verifier enforces.
#[derive(Debug, Clone, Default)]
pub struct VerificationPolicy {
    /// Required `aud` value. `None` disables audience validation.
    pub audience: Option<String>,
    /// Required `iss` value. `None` skips the issuer check.
    pub issuer: Option<String>,
}

impl VerificationPolicy {
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.validate_exp = true;
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }
        validation
    }
}

/// Resolves signing keys and verifies identity tokens.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Find the key (and its algorithm) matching the token's `kid`.
    async fn resolve_key(&self, token: &str) -> Result<(Algorithm, DecodingKey), VerifyError>;

    /// Check signature and claims with an already-resolved key.
    fn verify(
        &self,
        token: &str,
        alg: Algorithm,
        key: &DecodingKey,
    ) -> Result<IdTokenClaims, VerifyError>;

    /// Resolve the key, then verify.
    async fn verify_token(&self, token: &str) -> Result<IdTokenClaims, VerifyError> {
        let (alg, key) = self.resolve_key(token).await?;
        self.verify(token, alg, &key)
    }
}

/// [`TokenVerifier`] backed by the provider's JWKS endpoint.
#[derive(Clone)]
pub struct JwksVerifier {
    jwks: Arc<JwksCache>,
    policy: VerificationPolicy,
}

impl JwksVerifier {
    pub fn new(jwks: Arc<JwksCache>, policy: VerificationPolicy) -> Self {
        Self { jwks, policy }
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn resolve_key(&self, token: &str) -> Result<(Algorithm, DecodingKey), VerifyError> {
        let header = decode_header(token)
            .map_err(|e| VerifyError::TokenMalformed(format!("Invalid JWT header: {e}")))?;

        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| VerifyError::KeyResolutionFailed("JWT header missing kid".into()))?;

        self.jwks.get_key(kid).await
    }

    fn verify(
        &self,
        token: &str,
        alg: Algorithm,
        key: &DecodingKey,
    ) -> Result<IdTokenClaims, VerifyError> {
        let token_data = decode::<IdTokenClaims>(token, key, &self.policy.validation(alg))?;
        Ok(token_data.claims)
    }
}
