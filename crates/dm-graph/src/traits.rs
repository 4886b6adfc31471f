//! Directory service client trait

use crate::error::GraphResult;
use async_trait::async_trait;
use serde_json::Value;

/// Property-scoped listing of one collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    /// Collection path relative to the API root (e.g. `servicePrincipals`)
    pub collection: String,
    /// Properties to return (`$select`); empty means the service default
    pub select: Vec<String>,
    /// Server-side filter (`$filter`)
    pub filter: Option<String>,
}

impl EntityQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }
}

/// Read access to the directory.
///
/// Implementations must be Send + Sync for async operation. Listings are
/// fully paged before they return.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Every entity of a collection matching the query
    async fn list(&self, query: &EntityQuery) -> GraphResult<Vec<Value>>;

    /// One entity by id, restricted to `select` when non-empty
    async fn get_entity(&self, collection: &str, id: &str, select: &[&str]) -> GraphResult<Value>;

    /// Sub-resources under a parent (e.g. `servicePrincipals/{id}/appRoleAssignedTo`)
    async fn list_related(
        &self,
        collection: &str,
        id: &str,
        relation: &str,
        select: &[&str],
    ) -> GraphResult<Vec<Value>>;

    /// Client type identifier for logging
    fn client_type(&self) -> &'static str;
}
