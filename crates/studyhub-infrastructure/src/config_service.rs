//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` under the StudyHub config
//! directory, writing a default file on first run, then applies environment
//! overrides.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use studyhub_core::config::RootConfig;
use studyhub_core::error::{Result, StudyhubError};

use crate::paths::StudyhubPaths;

pub const ENV_BACKEND_URL: &str = "STUDYHUB_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "STUDYHUB_ANON_KEY";
pub const ENV_SESSION_TIMEOUT_MS: &str = "STUDYHUB_SESSION_TIMEOUT_MS";
pub const ENV_HARD_CEILING_MS: &str = "STUDYHUB_HARD_CEILING_MS";
pub const ENV_PROFILE_TIMEOUT_MS: &str = "STUDYHUB_PROFILE_TIMEOUT_MS";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Configuration service that loads and caches the root configuration.
///
/// The file is read on first access; [`invalidate_cache`](Self::invalidate_cache)
/// forces a reload.
#[derive(Clone)]
pub struct ConfigService {
    path: PathBuf,
    env: EnvLookup,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            env: Arc::new(|key| std::env::var(key).ok()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service for the default config file location.
    pub fn from_paths(paths: &StudyhubPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| StudyhubError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    /// Replaces the environment lookup (tests).
    pub fn with_env(mut self, env: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the root configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let read_lock = self
                .config
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        {
            let mut write_lock = self
                .config
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *write_lock = None;
    }

    fn load_config(&self) -> Result<RootConfig> {
        let mut config = match std::fs::read_to_string(&self.path) {
            Ok(content) => toml::from_str::<RootConfig>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let default_config = RootConfig::default();
                self.save_default(&default_config)?;
                default_config
            }
            Err(e) => return Err(e.into()),
        };

        self.apply_env(&mut config)?;
        config.validate()?;
        tracing::debug!("[Config] Loaded {}", self.path.display());
        Ok(config)
    }

    fn save_default(&self, config: &RootConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(config)?)?;
        tracing::info!("[Config] Created default config at {}", self.path.display());
        Ok(())
    }

    fn apply_env(&self, config: &mut RootConfig) -> Result<()> {
        if let Some(url) = (self.env)(ENV_BACKEND_URL) {
            config.backend.url = url;
        }
        if let Some(key) = (self.env)(ENV_ANON_KEY) {
            config.backend.anon_key = key;
        }

        for (name, slot) in [
            (ENV_SESSION_TIMEOUT_MS, &mut config.auth.session_timeout_ms),
            (ENV_HARD_CEILING_MS, &mut config.auth.hard_ceiling_ms),
            (ENV_PROFILE_TIMEOUT_MS, &mut config.auth.profile_timeout_ms),
        ] {
            if let Some(raw) = (self.env)(name) {
                *slot = raw.trim().parse().map_err(|_| {
                    StudyhubError::config(format!("{name} must be a number of milliseconds, got '{raw}'"))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_file_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let paths = StudyhubPaths::new(Some(temp_dir.path()));
        let service = ConfigService::from_paths(&paths).unwrap().with_env(env(&[]));

        let config = service.get_config().unwrap();

        assert_eq!(config, RootConfig::default());
        assert!(service.path().exists());
    }

    #[test]
    fn test_file_values_and_env_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [backend]
            url = "https://file.supabase.co"
            anon_key = "file-key"

            [auth]
            session_timeout_ms = 3000
            "#,
        )
        .unwrap();

        let service = ConfigService::new(path).with_env(env(&[
            (ENV_ANON_KEY, "env-key"),
            (ENV_HARD_CEILING_MS, "5000"),
        ]));
        let config = service.get_config().unwrap();

        assert_eq!(config.backend.url, "https://file.supabase.co");
        assert_eq!(config.backend.anon_key, "env-key");
        assert_eq!(config.auth.session_timeout_ms, 3000);
        assert_eq!(config.auth.hard_ceiling_ms, 5000);
    }

    #[test]
    fn test_invalid_env_number_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"))
            .with_env(env(&[(ENV_SESSION_TIMEOUT_MS, "soon")]));

        assert!(service.get_config().unwrap_err().is_config());
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"))
            .with_env(env(&[(ENV_PROFILE_TIMEOUT_MS, "0")]));

        assert!(service.get_config().unwrap_err().is_config());
    }

    #[test]
    fn test_cache_and_invalidate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::new(path.clone()).with_env(env(&[]));

        assert_eq!(service.get_config().unwrap().backend.url, "");

        std::fs::write(&path, "[backend]\nurl = \"https://new.supabase.co\"\n").unwrap();
        assert_eq!(service.get_config().unwrap().backend.url, "");

        service.invalidate_cache();
        assert_eq!(
            service.get_config().unwrap().backend.url,
            "https://new.supabase.co"
        );
    }
}
