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

//! OAuth2/OIDC client side: OIDC discovery, JWKS caching, JWT verification,
//! PKCE authorization redirects, code exchange, and ID token claims.

pub mod claims;
pub mod discovery;
pub mod exchange;
pub mod jwks;
pub mod provider;
pub mod verify;

pub use claims::IdTokenClaims;
pub use discovery::{discover_oidc_endpoints, OidcEndpoints};
pub use exchange::{build_auth_url, AuthUrlParams, OAuthTokenResponse};
pub use jwks::JwksCache;
pub use provider::{
    AuthorizationRedirect, IdentityProvider, OidcProvider, PendingAuthorization, ProviderError,
    TokenSet,
};
pub use verify::{JwksVerifier, TokenVerifier, VerificationPolicy, VerifyError};
