//! Durable storage for the auth token.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store persists exactly one value: the bearer token. It lives
//! under a single key (a JSON file on disk in production); an absent key
//! means the next start is anonymous.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Single-key token persistence.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Read the stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store exists but cannot be read.
    async fn load(&self) -> std::io::Result<Option<String>>;

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be written.
    async fn save(&self, token: &str) -> std::io::Result<()>;

    /// Remove the stored token. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing token cannot be removed.
    async fn clear(&self) -> std::io::Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// Token stored as `{"token": "..."}` in one file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> std::io::Result<Option<String>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        // A corrupt file is treated as no token rather than a hard failure.
        let Ok(stored) = serde_json::from_str::<StoredToken>(&raw) else {
            tracing::warn!(path = %self.path.display(), "ignoring unreadable token file");
            return Ok(None);
        };
        Ok(Some(stored.token).filter(|t| !t.is_empty()))
    }

    async fn save(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string(&StoredToken { token: token.to_owned() })?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }

    async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-process token store for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_owned())) }
    }

    /// Current value without going through the async trait.
    #[must_use]
    pub fn peek(&self) -> Option<String> {
        self.token.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> std::io::Result<Option<String>> {
        Ok(self.peek())
    }

    async fn save(&self, token: &str) -> std::io::Result<()> {
        let mut slot = self.token.lock().map_err(|_| std::io::Error::other("token store poisoned"))?;
        *slot = Some(token.to_owned());
        Ok(())
    }

    async fn clear(&self) -> std::io::Result<()> {
        let mut slot = self.token.lock().map_err(|_| std::io::Error::other("token store poisoned"))?;
        *slot = None;
        Ok(())
    }
}
