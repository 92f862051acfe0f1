//! REST API client module for the authentication backend.
//!
//! This module provides the `ApiClient` for talking to the two remote
//! collaborators of the session controller:
//! - the session verifier (`GET /user/me`), which resolves a bearer token
//!   to the user it belongs to
//! - the credential exchange (`POST /login`, `POST /register`)
//!
//! `AuthBackend` is the seam the controller is written against, so the
//! HTTP client can be swapped for an in-process implementation.

pub mod client;
pub mod error;

use std::future::Future;

use crate::models::{BearerToken, Credentials, Identity, RegistrationData};

pub use client::ApiClient;
pub use error::ApiError;

/// Remote calls the session controller depends on.
pub trait AuthBackend {
    /// Resolve a token to the identity it belongs to. Any rejection means
    /// the token is not valid.
    fn verify(&self, token: &BearerToken)
        -> impl Future<Output = Result<Identity, ApiError>> + Send;

    /// Exchange credentials for a raw token (without the `Bearer ` prefix).
    fn exchange_login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Submit registration fields. Success is only an acknowledgement.
    fn exchange_register(
        &self,
        data: &RegistrationData,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
