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

//! Login relay server entry point.
//!
//! A standalone Axum service that logs browser users in through Auth0 and
//! verifies the ID tokens the frontend sends back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use login_relay::config::Config;
use login_relay::oauth::{JwksVerifier, OidcEndpoints, OidcProvider, VerificationPolicy};
use login_relay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    login_relay::init_tracing();

    let config =
        Config::from_env().map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;
    tracing::debug!(?config, "Loaded configuration");

    if config.cookie_scheme_mismatch() {
        tracing::warn!(
            "COOKIE_SECURE is enabled but PUBLIC_URL ({}) is not https; browsers will drop the cookies",
            config.public_url
        );
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let provider = match OidcProvider::discover(http.clone(), &config.auth0).await {
        Ok(provider) => provider,
        Err(e) => {
            tracing::warn!("{e}; falling back to default Auth0 endpoints");
            OidcProvider::with_endpoints(
                http,
                &config.auth0,
                OidcEndpoints::auth0(&config.auth0.base_url()),
            )
        }
    };

    let mut policy = VerificationPolicy::default();
    if config.verify_audience {
        policy = policy.with_audience(config.auth0.client_id.clone());
    }
    let verifier = JwksVerifier::new(provider.jwks(), policy);

    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(config, Arc::new(provider), Arc::new(verifier));
    let app = login_relay::build_app(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;

    tracing::info!("Login relay listening on {listen_addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
