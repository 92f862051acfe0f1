use anyhow::Result;

use crate::models::BearerToken;

/// A single durable slot holding the current bearer token.
///
/// Purely mechanical: no validation and no expiry. Implementations must
/// survive process restarts within one backend origin.
pub trait TokenStore {
    fn get(&self) -> Result<Option<BearerToken>>;

    fn set(&mut self, token: &BearerToken) -> Result<()>;

    /// Removing an absent token is not an error
    fn clear(&mut self) -> Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn get(&self) -> Result<Option<BearerToken>> {
        (**self).get()
    }

    fn set(&mut self, token: &BearerToken) -> Result<()> {
        (**self).set(token)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// Process-local store. Only durable for as long as the value lives.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<BearerToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: BearerToken) -> Self {
        Self { token: Some(token) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<BearerToken>> {
        Ok(self.token.clone())
    }

    fn set(&mut self, token: &BearerToken) -> Result<()> {
        self.token = Some(token.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}
