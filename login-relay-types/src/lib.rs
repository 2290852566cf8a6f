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

//! Shared API types for the login-relay auth backend.
//!
//! This crate defines the JSON contract between the relay and the
//! single-page frontend that calls it. It is intentionally framework-agnostic:
//! no axum, no HTTP client types.

pub mod error;
pub mod requests;
pub mod responses;

pub use error::ErrorDetail;
pub use requests::VerifyTokenRequest;
pub use responses::{ProfileResponse, SessionStatusResponse, VerifyTokenResponse};
