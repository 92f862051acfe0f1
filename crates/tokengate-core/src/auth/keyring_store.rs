use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::APP_NAME;
use crate::models::BearerToken;

use super::TokenStore;

/// Token store backed by the OS keychain.
///
/// One entry per backend origin: service `tokengate`, account = origin.
#[derive(Debug)]
pub struct KeyringTokenStore {
    origin: String,
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new(origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let entry = Entry::new(APP_NAME, &origin).context("Failed to create keyring entry")?;
        Ok(Self { origin, entry })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<BearerToken>> {
        match self.entry.get_password() {
            Ok(value) => Ok(Some(BearerToken::from_stored(value))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&mut self, token: &BearerToken) -> Result<()> {
        self.entry
            .set_password(token.as_header_value())
            .context("Failed to store token in keychain")
    }

    fn clear(&mut self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
