//! [`ProfileStore`] backed by the `profiles` table.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use studyhub_core::error::Result;
use studyhub_core::user::{Profile, ProfilePatch, ProfileStore};
use uuid::Uuid;

use super::client::{BackendClient, Target, eq_param};

const TABLE: &str = "profiles";
const ENTITY_TYPE: &str = "profile";

pub struct PostgrestProfileStore {
    client: Arc<BackendClient>,
}

impl PostgrestProfileStore {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

fn select_all() -> (String, String) {
    ("select".to_string(), "*".to_string())
}

#[async_trait]
impl ProfileStore for PostgrestProfileStore {
    async fn select(&self, id: Uuid) -> Result<Profile> {
        let id_text = id.to_string();
        self.client
            .select_one(
                TABLE,
                &[select_all(), eq_param("id", id)],
                Target {
                    entity_type: ENTITY_TYPE,
                    id: &id_text,
                },
            )
            .await
    }

    async fn insert(&self, profile: &Profile) -> Result<Profile> {
        let id_text = profile.id.to_string();
        self.client
            .write_one(
                Method::POST,
                TABLE,
                &[select_all()],
                profile,
                Target {
                    entity_type: ENTITY_TYPE,
                    id: &id_text,
                },
            )
            .await
    }

    async fn update(&self, id: Uuid, patch: &ProfilePatch) -> Result<Profile> {
        let id_text = id.to_string();
        self.client
            .write_one(
                Method::PATCH,
                TABLE,
                &[select_all(), eq_param("id", id)],
                patch,
                Target {
                    entity_type: ENTITY_TYPE,
                    id: &id_text,
                },
            )
            .await
    }
}
