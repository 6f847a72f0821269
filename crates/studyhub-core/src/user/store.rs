//! Profile store trait.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Profile, ProfilePatch};
use crate::error::Result;

/// Remote keyed store of profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profile for an identity.
    ///
    /// # Returns
    ///
    /// - `Ok(Profile)`: profile found
    /// - `Err(StudyhubError::NotFound { .. })`: no row for this identity
    /// - `Err(_)`: any other failure (network, permission, ...)
    async fn select(&self, id: Uuid) -> Result<Profile>;

    /// Inserts a profile and returns the stored record.
    async fn insert(&self, profile: &Profile) -> Result<Profile>;

    /// Applies a partial update and returns the stored record.
    async fn update(&self, id: Uuid, patch: &ProfilePatch) -> Result<Profile>;
}
