//! [`EntityTable`] over the hosted table API.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use studyhub_core::error::Result;
use studyhub_core::repository::{Entity, EntityTable, Query};
use uuid::Uuid;

use super::client::{BackendClient, Target, eq_param};
use super::query::query_pairs;

/// One backend table, typed by its row.
///
/// `select` is the column list sent with reads, so embedded relations
/// (`*,author:profiles(name)`) can be requested per table.
pub struct PostgrestTable<E> {
    client: Arc<BackendClient>,
    select: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PostgrestTable<E> {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self {
            client,
            select: "*".to_string(),
            _entity: PhantomData,
        }
    }

    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = select.into();
        self
    }

    fn by_id(&self, id: Uuid) -> Vec<(String, String)> {
        vec![
            ("select".to_string(), self.select.clone()),
            eq_param("id", id),
        ]
    }
}

#[async_trait]
impl<E: Entity> EntityTable<E> for PostgrestTable<E> {
    async fn list(&self, query: &Query) -> Result<Vec<E>> {
        let params = query_pairs(&self.select, query);
        let rows: Vec<E> = self
            .client
            .select_many(E::TABLE, &params, E::ENTITY_TYPE)
            .await?;
        tracing::debug!("[Backend] {} rows from {}", rows.len(), E::TABLE);
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<E> {
        let id_text = id.to_string();
        self.client
            .select_one(
                E::TABLE,
                &self.by_id(id),
                Target {
                    entity_type: E::ENTITY_TYPE,
                    id: &id_text,
                },
            )
            .await
    }

    async fn create(&self, draft: &E::Draft) -> Result<E> {
        let params = vec![("select".to_string(), self.select.clone())];
        self.client
            .write_one(
                Method::POST,
                E::TABLE,
                &params,
                draft,
                Target {
                    entity_type: E::ENTITY_TYPE,
                    id: "new",
                },
            )
            .await
    }

    async fn update(&self, id: Uuid, patch: &E::Patch) -> Result<E> {
        let id_text = id.to_string();
        self.client
            .write_one(
                Method::PATCH,
                E::TABLE,
                &self.by_id(id),
                patch,
                Target {
                    entity_type: E::ENTITY_TYPE,
                    id: &id_text,
                },
            )
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_text = id.to_string();
        self.client
            .delete(
                E::TABLE,
                &[eq_param("id", id)],
                Target {
                    entity_type: E::ENTITY_TYPE,
                    id: &id_text,
                },
            )
            .await
    }
}
