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

//! Login relay route handlers: login, callback, verify, logout, getcookie,
//! session and profile.
//!
//! The browser holds two cookies. `session` is the signed, `HttpOnly` session
//! id managed by `tower-sessions`. `token` carries the raw ID token and is
//! readable by the frontend so it can call `/auth/verify`.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use login_relay_types::{
    ProfileResponse, SessionStatusResponse, VerifyTokenRequest, VerifyTokenResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use url::Url;

use crate::auth::{token_cookie, SessionUser, TOKEN_COOKIE};
use crate::error::AppError;
use crate::oauth::{PendingAuthorization, TokenSet, VerifyError};
use crate::session::{PENDING_KEY, USER_KEY};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Cookie helpers
// ---------------------------------------------------------------------------

fn token_cookie_attributes(domain: Option<&str>, secure: bool) -> String {
    let mut attrs = if secure {
        "Path=/; SameSite=None; Secure".to_string()
    } else {
        "Path=/; SameSite=Lax".to_string()
    };
    if let Some(d) = domain {
        attrs.push_str(&format!("; Domain={d}"));
    }
    attrs
}

/// Build a `Set-Cookie` header value for the frontend-readable ID token.
fn build_token_cookie(id_token: &str, domain: Option<&str>, secure: bool) -> String {
    format!(
        "{TOKEN_COOKIE}={id_token}; {}",
        token_cookie_attributes(domain, secure)
    )
}

/// Build a `Set-Cookie` header that deletes the `token` cookie.
fn build_clear_token_cookie(domain: Option<&str>, secure: bool) -> String {
    format!(
        "{TOKEN_COOKIE}=; Max-Age=0; {}",
        token_cookie_attributes(domain, secure)
    )
}

/// `302 Found` to `target`.
fn found(target: &str) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(target)
        .map_err(|e| AppError::internal(&format!("invalid redirect target: {e}")))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

fn append_cookie(response: &mut Response, cookie: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::internal(&format!("invalid Set-Cookie value: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Parameters the provider sends back to the callback, as query or form body.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /auth/login
///
/// Generates state, nonce and PKCE, remembers them in the session, and
/// redirects to the identity provider.
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let redirect_uri = state.config.callback_url();
    let redirect = state.provider.build_authorization_redirect(&redirect_uri)?;

    session.insert(PENDING_KEY, &redirect.pending).await?;

    tracing::debug!(redirect_uri = %redirect_uri, "Redirecting to identity provider");
    found(&redirect.url)
}

/// GET /auth/callback?code=...&state=...
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    complete_login(&state, &session, params).await
}

/// POST /auth/callback (`response_mode=form_post`)
pub async fn callback_form(
    State(state): State<AppState>,
    session: Session,
    Form(params): Form<CallbackParams>,
) -> Result<Response, AppError> {
    complete_login(&state, &session, params).await
}

/// Why a callback did not produce a login. Sent back to the frontend as
/// `?error=<code>&error_description=<description>`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CallbackFailure {
    code: String,
    description: String,
}

impl CallbackFailure {
    fn new(code: &str, description: &str) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
        }
    }
}

/// Match the callback `state` against the pending authorization.
///
/// A mismatch leaves the pending authorization in place, so a forged callback
/// cannot cancel a login that is still in flight.
fn match_state(
    pending: Option<PendingAuthorization>,
    params: &CallbackParams,
) -> Result<PendingAuthorization, CallbackFailure> {
    let pending = pending.ok_or_else(|| {
        CallbackFailure::new("missing_state", "No login is in progress for this session")
    })?;

    if params.state.as_deref() != Some(pending.state.as_str()) {
        return Err(CallbackFailure::new(
            "invalid_state",
            "The login response did not match this session",
        ));
    }
    Ok(pending)
}

/// Redeem the code of a callback whose state already matched.
async fn authorize(
    state: &AppState,
    pending: PendingAuthorization,
    params: CallbackParams,
) -> Result<TokenSet, CallbackFailure> {
    if let Some(error) = params.error {
        let description = params
            .error_description
            .unwrap_or_else(|| "The identity provider rejected the login".to_string());
        return Err(CallbackFailure {
            code: error,
            description,
        });
    }

    if pending.is_expired() {
        return Err(CallbackFailure::new(
            "expired_state",
            "The login took too long, please try again",
        ));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CallbackFailure::new("missing_code", "No authorization code received"))?;

    state
        .provider
        .exchange_code(&pending, &code)
        .await
        .map_err(|e| {
            tracing::warn!("Authorization code exchange failed: {e}");
            CallbackFailure::new(
                "exchange_failed",
                "Could not complete login with the identity provider",
            )
        })
}

async fn complete_login(
    state: &AppState,
    session: &Session,
    params: CallbackParams,
) -> Result<Response, AppError> {
    let pending = session.get::<PendingAuthorization>(PENDING_KEY).await?;

    let outcome = match match_state(pending, &params) {
        Ok(pending) => {
            // Single use once the state matched, whatever the outcome.
            session.remove::<PendingAuthorization>(PENDING_KEY).await?;
            authorize(state, pending, params).await
        }
        Err(failure) => Err(failure),
    };

    match outcome {
        Ok(tokens) => {
            session.cycle_id().await?;
            session.insert(USER_KEY, &tokens).await?;

            let cookie = build_token_cookie(
                &tokens.id_token,
                state.config.cookie_domain.as_deref(),
                state.config.cookie_secure,
            );

            tracing::info!(
                sub = %tokens.userinfo.sub,
                "Login successful for {}, redirecting to {}",
                tokens.userinfo.display_name(),
                state.config.frontend_url
            );

            let mut response = found(state.config.frontend_url.as_str())?;
            append_cookie(&mut response, &cookie)?;
            Ok(response)
        }
        Err(failure) => {
            tracing::warn!(
                error = %failure.code,
                "OAuth callback failed: {}",
                failure.description
            );
            found(&failure_redirect(&state.config.frontend_url, &failure))
        }
    }
}

fn failure_redirect(frontend_url: &Url, failure: &CallbackFailure) -> String {
    let mut url = frontend_url.clone();
    url.query_pairs_mut()
        .append_pair("error", &failure.code)
        .append_pair("error_description", &failure.description);
    url.to_string()
}

/// POST /auth/verify -- `{ "id_token": "..." }`
///
/// 200 when the token's signature and expiry check out against the
/// provider's keys; 400 when no token was sent; 401 otherwise.
pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyTokenRequest>, JsonRejection>,
) -> Result<Json<VerifyTokenResponse>, AppError> {
    let token = match &payload {
        Ok(Json(request)) => request.token(),
        Err(rejection) => {
            tracing::debug!("Unreadable verify request body: {rejection}");
            None
        }
    }
    .ok_or(VerifyError::MissingToken)?;

    let claims = state.verifier.verify_token(token).await.map_err(|e| {
        tracing::info!("Token verification failed: {e}");
        e
    })?;

    tracing::debug!(sub = %claims.sub, "Token verified");
    Ok(Json(VerifyTokenResponse::success()))
}

/// GET /auth/logout -- clears the session and the `token` cookie, then
/// redirects through the provider's logout endpoint.
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    session.flush().await?;

    let target = state
        .provider
        .logout_redirect(state.config.logout_return_url.as_str())?;
    let clear = build_clear_token_cookie(
        state.config.cookie_domain.as_deref(),
        state.config.cookie_secure,
    );

    tracing::info!("Session cleared, redirecting to provider logout");

    let mut response = found(&target)?;
    append_cookie(&mut response, &clear)?;
    Ok(response)
}

/// GET|POST /auth/getcookie -- notes whether the frontend sent its `token`
/// cookie, then sends the browser back to the frontend.
pub async fn getcookie(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    match token_cookie(&headers) {
        Some(token) => tracing::debug!(len = token.len(), "token cookie present"),
        None => tracing::debug!("token cookie absent"),
    }
    found(state.config.frontend_url.as_str())
}

/// GET /auth/session -- 200 when logged in, 401 otherwise.
pub async fn check_session(SessionUser(_): SessionUser) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse {
        authenticated: true,
    })
}

/// GET /auth/profile -- identity claims of the logged-in user.
pub async fn get_profile(SessionUser(tokens): SessionUser) -> Json<ProfileResponse> {
    let claims = tokens.userinfo;
    Json(ProfileResponse {
        name: claims.display_name(),
        sub: claims.sub,
        email: claims.email,
        picture: claims.picture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookie_secure_uses_samesite_none() {
        let cookie = build_token_cookie("a.b.c", None, true);
        assert_eq!(cookie, "token=a.b.c; Path=/; SameSite=None; Secure");
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn token_cookie_over_http_is_lax_without_secure() {
        let cookie = build_token_cookie("a.b.c", None, false);
        assert_eq!(cookie, "token=a.b.c; Path=/; SameSite=Lax");
    }

    #[test]
    fn token_cookie_with_domain() {
        let cookie = build_token_cookie("a.b.c", Some(".example.com"), true);
        assert!(cookie.ends_with("; Domain=.example.com"));
    }

    #[test]
    fn clear_cookie_matches_set_attributes() {
        let cookie = build_clear_token_cookie(Some(".example.com"), true);
        assert_eq!(
            cookie,
            "token=; Max-Age=0; Path=/; SameSite=None; Secure; Domain=.example.com"
        );
    }

    #[test]
    fn failure_redirect_encodes_description() {
        let frontend = Url::parse("http://localhost:3000/").unwrap();
        let target = failure_redirect(
            &frontend,
            &CallbackFailure::new("invalid_state", "did not match"),
        );
        assert_eq!(
            target,
            "http://localhost:3000/?error=invalid_state&error_description=did+not+match"
        );
    }

    #[test]
    fn failure_redirect_keeps_existing_query() {
        let frontend = Url::parse("https://app.example.com/home?tab=1").unwrap();
        let target = failure_redirect(&frontend, &CallbackFailure::new("access_denied", "no"));
        assert_eq!(
            target,
            "https://app.example.com/home?tab=1&error=access_denied&error_description=no"
        );
    }

    fn pending(state: &str) -> PendingAuthorization {
        PendingAuthorization {
            state: state.to_string(),
            nonce: "n".to_string(),
            code_verifier: "v".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    #[test]
    fn found_is_302_with_location() {
        let resp = found("https://tenant.auth0.com/authorize?x=1").unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers()[header::LOCATION],
            "https://tenant.auth0.com/authorize?x=1"
        );
    }

    #[test]
    fn state_is_checked_before_provider_error() {
        let params = CallbackParams {
            state: Some("forged".to_string()),
            error: Some("access_denied".to_string()),
            error_description: Some("Call support".to_string()),
            ..Default::default()
        };
        let failure = match_state(Some(pending("real")), &params).unwrap_err();
        assert_eq!(failure.code, "invalid_state");
    }

    #[test]
    fn missing_state_param_is_invalid_state() {
        let failure = match_state(Some(pending("real")), &CallbackParams::default()).unwrap_err();
        assert_eq!(failure.code, "invalid_state");
    }

    #[test]
    fn no_pending_login_is_missing_state() {
        let params = CallbackParams {
            state: Some("real".to_string()),
            ..Default::default()
        };
        let failure = match_state(None, &params).unwrap_err();
        assert_eq!(failure.code, "missing_state");
    }
}
