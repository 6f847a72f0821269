//! Persistence for the signed-in session between runs.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use studyhub_core::auth::Session;
use studyhub_core::error::{Result, StudyhubError};

use crate::paths::StudyhubPaths;

/// Storage key of the persisted session.
pub const SESSION_KEY: &str = "studyhub-session";

/// Where the session service keeps its current session.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Returns the stored session, `None` when nothing (usable) is stored.
    async fn load(&self) -> Result<Option<Session>>;

    async fn store(&self, session: &Session) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// JSON file under the config directory.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage at the default location for [`SESSION_KEY`].
    pub fn from_paths(paths: &StudyhubPaths) -> Result<Self> {
        let path = paths
            .session_file(SESSION_KEY)
            .map_err(|e| StudyhubError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Result<Option<Session>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(
                    "[Session] Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn store(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(session)?;

        // tmp file + rename
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage, used when sessions must not outlive the process.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<Session>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn store(&self, session: &Session) -> Result<()> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}
