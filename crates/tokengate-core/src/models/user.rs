use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user record asserted by the backend for a verified token.
///
/// The controller never interprets it beyond its existence, so it is kept as
/// raw JSON. A JSON `null` is not an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Value);

impl Identity {
    pub fn new(value: Value) -> Option<Self> {
        if value.is_null() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Best-effort human label: `username`, then `name`
    pub fn display_name(&self) -> Option<&str> {
        ["username", "name"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }
}

/// Username and password for a login exchange. Never persisted.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password().is_empty()
    }
}

/// Arbitrary registration fields, sent to the backend as a JSON object.
#[derive(Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RegistrationData(Map<String, Value>);

impl RegistrationData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RegistrationData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// Field values may hold passwords, so only the field names are shown.
impl fmt::Debug for RegistrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationData")
            .field("fields", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}
