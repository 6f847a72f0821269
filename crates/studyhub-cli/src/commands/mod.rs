pub mod auth;
pub mod finance;

use std::sync::Arc;

use anyhow::{Context, Result};
use studyhub_application::{AuthContext, ProfileReconciler};
use studyhub_core::config::RootConfig;
use studyhub_core::user::ProfileStore;
use studyhub_infrastructure::{
    BackendClient, ConfigService, FileSessionStorage, GoTrueSessionService, MemorySessionStorage,
    PostgrestProfileStore, SessionStorage, StudyhubPaths,
};

/// Everything a command needs, wired from `config.toml`.
pub struct App {
    pub config: RootConfig,
    pub client: Arc<BackendClient>,
    pub auth: Arc<AuthContext>,
}

impl App {
    pub fn build() -> Result<Self> {
        let paths = StudyhubPaths::default();
        let config = ConfigService::from_paths(&paths)?
            .get_config()
            .context("Failed to load configuration")?;

        let client = Arc::new(
            BackendClient::new(&config.backend)
                .context("Set backend.url and backend.anon_key in config.toml or STUDYHUB_* env")?,
        );

        let storage: Arc<dyn SessionStorage> = if config.auth.persist_session {
            Arc::new(FileSessionStorage::from_paths(&paths)?)
        } else {
            Arc::new(MemorySessionStorage::new())
        };

        let sessions = Arc::new(GoTrueSessionService::new(client.clone(), storage));
        let profiles: Arc<dyn ProfileStore> = Arc::new(PostgrestProfileStore::new(client.clone()));
        let reconciler = Arc::new(ProfileReconciler::new(
            profiles.clone(),
            config.profile.clone(),
            config.auth.profile_timeout(),
        ));
        let auth = AuthContext::new(sessions, profiles, reconciler, config.auth.clone());

        Ok(Self {
            config,
            client,
            auth,
        })
    }
}

pub(crate) fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
