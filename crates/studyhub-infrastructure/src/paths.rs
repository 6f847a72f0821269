//! Unified path management for StudyHub configuration files.
//!
//! Paths are resolved under the platform config directory (via `dirs`), or
//! under an explicit base directory when one is given.

use std::path::{Path, PathBuf};

/// Application directory name under the platform config directory.
const APP_DIR: &str = "studyhub";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path layout for StudyHub.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/studyhub/          # Config directory
/// ├── config.toml              # Application configuration
/// └── studyhub-session.json    # Persisted session (when enabled)
/// ```
#[derive(Debug, Clone)]
pub struct StudyhubPaths {
    base: Option<PathBuf>,
}

impl StudyhubPaths {
    /// `base` overrides the platform config directory (used by tests).
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the StudyHub configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    /// Returns the path to the main configuration file.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path of the persisted session stored under `key`.
    pub fn session_file(&self, key: &str) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(format!("{key}.json")))
    }
}

impl Default for StudyhubPaths {
    fn default() -> Self {
        Self::new(None)
    }
}
