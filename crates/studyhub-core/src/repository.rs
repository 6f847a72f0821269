//! Generic table access for feature entities.
//!
//! Every feature family (study sessions, polls, board, resources, financial
//! records, trends) is a set of flat rows owned by the backend. The client
//! fetches them, displays them and refetches after each mutation; there is no
//! cache coherency beyond that.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::Result;

/// A row type stored in one backend table.
pub trait Entity: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backend table name.
    const TABLE: &'static str;
    /// Name used in `NotFound` errors.
    const ENTITY_TYPE: &'static str;

    /// Payload for inserts.
    type Draft: Serialize + Send + Sync;
    /// Payload for partial updates.
    type Patch: Serialize + Send + Sync;

    fn id(&self) -> Uuid;
}

/// Patch type for rows the client never updates in place.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum Immutable {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gte,
    Lte,
    /// Case-insensitive pattern match (`%` wildcards)
    ILike,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::ILike => "ilike",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// List query: filters, ordering and an optional limit.
///
/// # Example
///
/// ```
/// use studyhub_core::repository::Query;
///
/// let query = Query::new()
///     .eq("session_id", "42")
///     .order_desc("created_at")
///     .limit(20);
/// assert_eq!(query.filters.len(), 1);
/// assert_eq!(query.limit, Some(20));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: impl Into<String>, op: FilterOp, value: impl ToString) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
            value: value.to_string(),
        });
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn neq(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Neq, value)
    }

    pub fn gte(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    pub fn lte(self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// CRUD access to one entity table.
///
/// Errors are returned to the caller as-is; nothing here retries.
#[async_trait]
pub trait EntityTable<E: Entity>: Send + Sync {
    async fn list(&self, query: &Query) -> Result<Vec<E>>;

    /// Fetches one row; a missing row is `StudyhubError::NotFound`.
    async fn get(&self, id: Uuid) -> Result<E>;

    async fn create(&self, draft: &E::Draft) -> Result<E>;

    async fn update(&self, id: Uuid, patch: &E::Patch) -> Result<E>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}
