//! tokengate - token-based session management for a remote auth backend.
//!
//! A `SessionController` keeps one authoritative answer to "who is signed
//! in" across restarts, using a persisted bearer token that is always
//! re-verified against the backend before it is trusted.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthBackend};
pub use auth::{
    AuthOutcome, FileTokenStore, KeyringTokenStore, MemoryTokenStore, Redirect, Session,
    SessionController, TokenStore,
};
pub use config::{Config, TokenStoreKind};
pub use models::{BearerToken, Credentials, Identity, RegistrationData};
