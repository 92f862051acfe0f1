//! Authentication module for managing the user's session.
//!
//! This module provides:
//! - `SessionController`: the login / register / logout state machine
//! - `TokenStore`: the single durable slot for the bearer token, with
//!   file, keychain and in-memory implementations
//! - `Session`, `AuthOutcome`, `Redirect`: what the controller exposes
//!
//! The stored token is never trusted until the backend has verified it.

pub mod controller;
pub mod file_store;
pub mod keyring_store;
pub mod session;
pub mod store;

pub use controller::{SessionController, LOGIN_FAILED, REGISTRATION_FAILED, USER_INFO_FAILED};
pub use file_store::{FileTokenStore, StoredToken};
pub use keyring_store::KeyringTokenStore;
pub use session::{AuthOutcome, Redirect, Session};
pub use store::{MemoryTokenStore, TokenStore};
