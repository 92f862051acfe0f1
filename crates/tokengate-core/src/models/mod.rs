//! Data models exchanged between the session controller and the backend.
//!
//! - `BearerToken`: the persisted `"Bearer <raw>"` authorization value
//! - `Identity`: the server-asserted user record, kept opaque
//! - `Credentials`, `RegistrationData`: transient request inputs

pub mod token;
pub mod user;

pub use token::BearerToken;
pub use user::{Credentials, Identity, RegistrationData};
