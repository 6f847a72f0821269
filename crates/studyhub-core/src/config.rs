//! Configuration models.
//!
//! `RootConfig` is the shape of `config.toml`; loading and environment
//! overrides live in the infrastructure crate.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyhubError};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    pub backend: BackendConfig,
    pub auth: AuthSettings,
    pub profile: ProfileDefaults,
}

impl RootConfig {
    /// Checks the values that would make the client unusable.
    pub fn validate(&self) -> Result<()> {
        self.auth.validate()
    }
}

/// Hosted backend endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
}

impl BackendConfig {
    /// Fails unless both the URL and the key are present.
    pub fn require(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(StudyhubError::config("backend.url is not set"));
        }
        if self.anon_key.trim().is_empty() {
            return Err(StudyhubError::config("backend.anon_key is not set"));
        }
        Ok(())
    }
}

/// Timing knobs for the session bootstrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Bound on the initial session check (default: 8000)
    pub session_timeout_ms: u64,
    /// Last-resort bound on the whole `loading` phase (default: 10000)
    pub hard_ceiling_ms: u64,
    /// Bound on the profile fetch (default: 8000)
    pub profile_timeout_ms: u64,
    /// Keep the session on disk between runs (default: true)
    pub persist_session: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_timeout_ms: 8_000,
            hard_ceiling_ms: 10_000,
            profile_timeout_ms: 8_000,
            persist_session: true,
        }
    }
}

impl AuthSettings {
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn hard_ceiling(&self) -> Duration {
        Duration::from_millis(self.hard_ceiling_ms)
    }

    pub fn profile_timeout(&self) -> Duration {
        Duration::from_millis(self.profile_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("auth.session_timeout_ms", self.session_timeout_ms),
            ("auth.hard_ceiling_ms", self.hard_ceiling_ms),
            ("auth.profile_timeout_ms", self.profile_timeout_ms),
        ] {
            if value == 0 {
                return Err(StudyhubError::config(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }
}

/// Values used when a profile has to be synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDefaults {
    /// Display name when the identity has no usable email
    pub fallback_name: String,
    pub department: String,
    pub position: String,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            fallback_name: "Member".to_string(),
            department: "KPC AI Lab".to_string(),
            position: "Member".to_string(),
        }
    }
}
