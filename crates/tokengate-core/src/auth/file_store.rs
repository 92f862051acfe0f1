use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::APP_NAME;
use crate::models::BearerToken;

use super::TokenStore;

/// Token file name in the per-origin data directory
const TOKEN_FILE: &str = "token.json";

/// On-disk layout: the token string under one key, plus when it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: BearerToken,
    pub stored_at: DateTime<Utc>,
}

/// Token store backed by a JSON file, one directory per backend origin.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store under the platform data directory, scoped to `origin`
    pub fn for_origin(origin: &str) -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(Self::new(data_dir.join(APP_NAME).join(origin_slug(origin))))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the full stored record, including its write timestamp
    pub fn load(&self) -> Result<Option<StoredToken>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        let stored: StoredToken =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(stored))
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<BearerToken>> {
        Ok(self.load()?.map(|stored| stored.token))
    }

    fn set(&mut self, token: &BearerToken) -> Result<()> {
        let path = self.token_path();
        std::fs::create_dir_all(&self.dir).context("Failed to create token directory")?;

        let stored = StoredToken {
            token: token.clone(),
            stored_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        write_private(&path, contents.as_bytes()).context("Failed to write token file")?;

        debug!(path = %path.display(), "Token written");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove token file")?;
            debug!(path = %path.display(), "Token removed");
        }
        Ok(())
    }
}

/// Write `contents` to `path`, readable by the owner only.
///
/// On unix the file is created with mode 0600, and an existing file is
/// narrowed to 0600 before the token goes in.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    let mut file = {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        let file = options.mode(0o600).open(path)?;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file
    };
    #[cfg(not(unix))]
    let mut file = options.open(path)?;

    file.write_all(contents)?;
    file.sync_all()
}

/// Turn an origin into a directory name.
///
/// ASCII letters, digits and `.` are kept, every other byte becomes `%XX`,
/// so distinct origins always get distinct directories.
pub(crate) fn origin_slug(origin: &str) -> String {
    let mut slug = String::with_capacity(origin.len());
    for byte in origin.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' {
            slug.push(char::from(byte));
        } else {
            slug.push_str(&format!("%{:02X}", byte));
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_origin_slug() {
        assert_eq!(
            origin_slug("http://localhost:3000"),
            "http%3A%2F%2Flocalhost%3A3000"
        );
        assert_eq!(
            origin_slug("https://api.example.com"),
            "https%3A%2F%2Fapi.example.com"
        );
    }

    #[test]
    fn test_origin_slug_keeps_origins_apart() {
        let origins = [
            "http://auth:8080",
            "http://auth-8080",
            "http://auth_8080",
            "http://auth%3A8080",
        ];
        let slugs: std::collections::HashSet<String> =
            origins.iter().map(|origin| origin_slug(origin)).collect();
        assert_eq!(slugs.len(), origins.len());

        for slug in &slugs {
            assert!(!slug.contains('/'));
        }
    }

    #[test]
    fn test_missing_file_is_absent() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTokenStore::new(tmp.path().join("origin"));
        assert!(store.get().unwrap().is_none());
        // Clearing an absent token is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_token_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("origin");

        let mut store = FileTokenStore::new(dir.clone());
        store.set(&BearerToken::from_raw("xyz")).unwrap();

        let reopened = FileTokenStore::new(dir);
        assert_eq!(reopened.get().unwrap(), Some(BearerToken::from_raw("xyz")));

        let stored = reopened.load().unwrap().unwrap();
        assert!(stored.stored_at <= Utc::now());
    }

    #[test]
    fn test_file_layout_holds_header_value() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTokenStore::new(tmp.path().to_path_buf());
        store.set(&BearerToken::from_raw("xyz")).unwrap();

        let raw = std::fs::read_to_string(tmp.path().join(TOKEN_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["token"], "Bearer xyz");
    }

    #[test]
    fn test_clear_removes_file() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileTokenStore::new(tmp.path().to_path_buf());
        store.set(&BearerToken::from_raw("xyz")).unwrap();
        store.clear().unwrap();
        assert!(!tmp.path().join(TOKEN_FILE).exists());
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(TOKEN_FILE), "{not json").unwrap();
        let store = FileTokenStore::new(tmp.path().to_path_buf());
        assert!(store.get().is_err());
    }

    #[test]
    fn test_origins_do_not_share_tokens() {
        let tmp = TempDir::new().unwrap();
        for (first, second) in [
            ("http://a.test", "http://b.test"),
            ("http://auth:8080", "http://auth-8080"),
        ] {
            let mut a = FileTokenStore::new(tmp.path().join(origin_slug(first)));
            let b = FileTokenStore::new(tmp.path().join(origin_slug(second)));

            a.set(&BearerToken::from_raw("for-a")).unwrap();
            assert!(b.get().unwrap().is_none(), "{} leaked to {}", first, second);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(TOKEN_FILE);

        // A pre-existing world-readable file is narrowed on write
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut store = FileTokenStore::new(tmp.path().to_path_buf());
        store.set(&BearerToken::from_raw("xyz")).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        store.clear().unwrap();
        store.set(&BearerToken::from_raw("abc")).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get().unwrap(), Some(BearerToken::from_raw("abc")));
    }
}
