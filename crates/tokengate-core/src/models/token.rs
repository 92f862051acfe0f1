use std::fmt;

use serde::{Deserialize, Serialize};

/// Scheme prefix stored in front of every raw token.
const BEARER_PREFIX: &str = "Bearer ";

/// A bearer token in its persisted form, `"Bearer <raw-token>"`.
///
/// The stored value is used verbatim as the `Authorization` header, so it is
/// never re-formatted once created. Presence of a token says nothing about
/// its validity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token as returned by the credential exchange
    pub fn from_raw(raw: &str) -> Self {
        Self(format!("{}{}", BEARER_PREFIX, raw))
    }

    /// Rehydrate a value read back from a token store, untouched
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The full value to send as the `Authorization` header
    pub fn as_header_value(&self) -> &str {
        &self.0
    }

    /// The token without its scheme prefix
    pub fn raw(&self) -> &str {
        self.0.strip_prefix(BEARER_PREFIX).unwrap_or(&self.0)
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}
