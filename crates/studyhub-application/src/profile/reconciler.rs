use std::sync::Arc;
use std::time::Duration;

use studyhub_core::auth::Identity;
use studyhub_core::config::ProfileDefaults;
use studyhub_core::timeout::with_timeout;
use studyhub_core::user::{Profile, ProfileStore, SignUpDetails};

/// Resolves the profile for an authenticated identity.
///
/// `resolve` is total: every failure of the profile store degrades to the
/// in-memory default profile, so callers never have to handle an error.
///
/// # Resolution order
///
/// 1. `select` by identity id, bounded by the profile timeout
/// 2. found: the stored record is returned verbatim
/// 3. not found: the default profile is inserted and the stored record returned
/// 4. anything else (network, permission, timeout, failed insert): the default
pub struct ProfileReconciler {
    store: Arc<dyn ProfileStore>,
    defaults: ProfileDefaults,
    timeout: Duration,
}

impl ProfileReconciler {
    pub fn new(store: Arc<dyn ProfileStore>, defaults: ProfileDefaults, timeout: Duration) -> Self {
        Self {
            store,
            defaults,
            timeout,
        }
    }

    pub fn defaults(&self) -> &ProfileDefaults {
        &self.defaults
    }

    /// The profile used until (or instead of) the stored one.
    pub fn default_profile(&self, identity: &Identity, details: Option<&SignUpDetails>) -> Profile {
        match details {
            Some(details) => Profile::seeded(identity, &self.defaults, details),
            None => Profile::fallback(identity, &self.defaults),
        }
    }

    pub async fn resolve(&self, identity: &Identity, details: Option<&SignUpDetails>) -> Profile {
        let fallback = self.default_profile(identity, details);

        let selected = match with_timeout("profile fetch", self.timeout, self.store.select(identity.id)).await {
            Ok(selected) => selected,
            Err(e) => {
                tracing::warn!("[Profile] {}, using default profile for {}", e, identity.id);
                return fallback;
            }
        };

        match selected {
            Ok(profile) => {
                tracing::debug!("[Profile] Loaded profile for {}", identity.id);
                profile
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("[Profile] No profile for {}, creating default", identity.id);
                self.create(fallback).await
            }
            Err(e) => {
                tracing::warn!(
                    "[Profile] Failed to load profile for {}: {}, using default",
                    identity.id,
                    e
                );
                fallback
            }
        }
    }

    /// Inserts `profile`; a concurrent insert by another client also lands here
    /// as an error and degrades to the in-memory record.
    async fn create(&self, profile: Profile) -> Profile {
        match with_timeout("profile insert", self.timeout, self.store.insert(&profile)).await {
            Ok(Ok(stored)) => stored,
            Ok(Err(e)) => {
                tracing::warn!("[Profile] Failed to create profile for {}: {}", profile.id, e);
                profile
            }
            Err(e) => {
                tracing::warn!("[Profile] {}", e);
                profile
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use studyhub_core::error::{Result, StudyhubError};
    use studyhub_core::user::ProfilePatch;
    use uuid::Uuid;

    #[derive(Clone)]
    enum Select {
        Found(Profile),
        Fails(StudyhubError),
        Hangs,
    }

    struct MockProfileStore {
        select: Select,
        insert_error: Option<StudyhubError>,
        inserted: Mutex<Vec<Profile>>,
        select_calls: AtomicUsize,
    }

    impl MockProfileStore {
        fn new(select: Select) -> Self {
            Self {
                select,
                insert_error: None,
                inserted: Mutex::new(Vec::new()),
                select_calls: AtomicUsize::new(0),
            }
        }

        fn failing_insert(mut self, error: StudyhubError) -> Self {
            self.insert_error = Some(error);
            self
        }
    }

    #[async_trait]
    impl ProfileStore for MockProfileStore {
        async fn select(&self, _id: Uuid) -> Result<Profile> {
            self.select_calls.fetch_add(1, Ordering::SeqCst);
            match &self.select {
                Select::Found(profile) => Ok(profile.clone()),
                Select::Fails(error) => Err(error.clone()),
                Select::Hangs => std::future::pending().await,
            }
        }

        async fn insert(&self, profile: &Profile) -> Result<Profile> {
            if let Some(error) = &self.insert_error {
                return Err(error.clone());
            }
            let mut stored = profile.clone();
            stored.bio = Some("stored".to_string());
            self.inserted.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn update(&self, _id: Uuid, _patch: &ProfilePatch) -> Result<Profile> {
            Err(StudyhubError::internal("not used"))
        }
    }

    fn identity() -> Identity {
        Identity::new(Uuid::new_v4(), "user@kpc.or.kr")
    }

    fn reconciler(store: Arc<MockProfileStore>) -> ProfileReconciler {
        ProfileReconciler::new(store, ProfileDefaults::default(), Duration::from_secs(8))
    }

    #[tokio::test]
    async fn test_found_profile_is_returned_verbatim() {
        let identity = identity();
        let mut remote = Profile::fallback(&identity, &ProfileDefaults::default());
        remote.name = "Remote Name".to_string();
        let store = Arc::new(MockProfileStore::new(Select::Found(remote.clone())));

        let profile = reconciler(store.clone()).resolve(&identity, None).await;

        assert_eq!(profile, remote);
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_inserts_default() {
        let identity = identity();
        let store = Arc::new(MockProfileStore::new(Select::Fails(StudyhubError::not_found(
            "profile",
            identity.id.to_string(),
        ))));

        let profile = reconciler(store.clone()).resolve(&identity, None).await;

        assert_eq!(profile.name, "user");
        assert_eq!(profile.id, identity.id);
        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0], profile);
    }

    #[tokio::test]
    async fn test_not_found_with_sign_up_details_seeds_insert() {
        let identity = identity();
        let store = Arc::new(MockProfileStore::new(Select::Fails(StudyhubError::not_found(
            "profile",
            identity.id.to_string(),
        ))));
        let details = SignUpDetails {
            name: Some("Choi".to_string()),
            bio: None,
            interests: vec!["rl".to_string()],
        };

        let profile = reconciler(store).resolve(&identity, Some(&details)).await;

        assert_eq!(profile.name, "Choi");
        assert_eq!(profile.interests, vec!["rl".to_string()]);
    }

    #[tokio::test]
    async fn test_every_store_failure_degrades_to_default() {
        let identity = identity();
        let expected = Profile::fallback(&identity, &ProfileDefaults::default());

        for error in [
            StudyhubError::network("connection reset"),
            StudyhubError::permission("row level security"),
            StudyhubError::internal("boom"),
        ] {
            let store = Arc::new(MockProfileStore::new(Select::Fails(error)));
            let profile = reconciler(store.clone()).resolve(&identity, None).await;
            assert_eq!(profile, expected);
            assert!(store.inserted.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_failed_insert_degrades_to_default() {
        let identity = identity();
        let store = Arc::new(
            MockProfileStore::new(Select::Fails(StudyhubError::not_found(
                "profile",
                identity.id.to_string(),
            )))
            .failing_insert(StudyhubError::validation("duplicate key")),
        );

        let profile = reconciler(store).resolve(&identity, None).await;

        assert_eq!(profile, Profile::fallback(&identity, &ProfileDefaults::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_select_times_out_to_default() {
        let identity = identity();
        let store = Arc::new(MockProfileStore::new(Select::Hangs));
        let reconciler = ProfileReconciler::new(
            store.clone(),
            ProfileDefaults::default(),
            Duration::from_millis(500),
        );

        let started = tokio::time::Instant::now();
        let profile = reconciler.resolve(&identity, None).await;

        assert_eq!(profile.name, "user");
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(store.select_calls.load(Ordering::SeqCst), 1);
    }
}
