//! In-memory directory for tests

use crate::error::{GraphError, GraphResult};
use crate::traits::{DirectoryClient, EntityQuery};
use async_trait::async_trait;
use dm_core::EntityFilter;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Failure to inject for a path
#[derive(Debug, Clone)]
enum Injected {
    NotFound,
    Status { status: u16, message: String },
}

/// Directory backed by fixed JSON documents.
///
/// Paths are the same relative paths `GraphClient` would request:
/// `collection`, `collection/id` and `collection/id/relation`. Server-side
/// filters are evaluated with the client-side predicate grammar when they
/// parse, and ignored otherwise.
#[derive(Default)]
pub struct InMemoryDirectory {
    collections: HashMap<String, Vec<Value>>,
    related: HashMap<String, Vec<Value>>,
    failures: HashMap<String, Injected>,
    calls: Mutex<Vec<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities of a collection; point lookups resolve against them by `id`
    pub fn with_collection(mut self, collection: &str, entities: Vec<Value>) -> Self {
        self.collections.insert(collection.to_string(), entities);
        self
    }

    pub fn with_related(mut self, collection: &str, id: &str, relation: &str, items: Vec<Value>) -> Self {
        self.related
            .insert(format!("{}/{}/{}", collection, id, relation), items);
        self
    }

    /// Answer 404 for `path`
    pub fn not_found(mut self, path: &str) -> Self {
        self.failures.insert(path.to_string(), Injected::NotFound);
        self
    }

    /// Answer an API error for `path`
    pub fn fail(mut self, path: &str, status: u16, message: &str) -> Self {
        self.failures.insert(
            path.to_string(),
            Injected::Status {
                status,
                message: message.to_string(),
            },
        );
        self
    }

    /// Paths requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, path: &str) -> GraphResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(path.to_string());
        }
        match self.failures.get(path) {
            None => Ok(()),
            Some(Injected::NotFound) => Err(GraphError::NotFound {
                resource: path.to_string(),
            }),
            Some(Injected::Status { status, message }) => Err(GraphError::Api {
                status: *status,
                code: "InjectedFailure".to_string(),
                message: message.clone(),
            }),
        }
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn list(&self, query: &EntityQuery) -> GraphResult<Vec<Value>> {
        self.record(&query.collection)?;
        let entities = self
            .collections
            .get(&query.collection)
            .cloned()
            .unwrap_or_default();

        let server_filter = query
            .filter
            .as_deref()
            .and_then(|f| EntityFilter::parse(f).ok());
        let Some(filter) = server_filter else {
            return Ok(entities);
        };
        Ok(entities
            .into_iter()
            .filter(|value| {
                dm_core::SourceEntity::from_json(value.clone())
                    .map(|e| filter.matches(&e))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn get_entity(&self, collection: &str, id: &str, _select: &[&str]) -> GraphResult<Value> {
        let path = format!("{}/{}", collection, id);
        self.record(&path)?;
        self.collections
            .get(collection)
            .and_then(|entities| {
                entities
                    .iter()
                    .find(|e| e.get("id").and_then(Value::as_str) == Some(id))
            })
            .cloned()
            .ok_or(GraphError::NotFound { resource: path })
    }

    async fn list_related(
        &self,
        collection: &str,
        id: &str,
        relation: &str,
        _select: &[&str],
    ) -> GraphResult<Vec<Value>> {
        let path = format!("{}/{}/{}", collection, id, relation);
        self.record(&path)?;
        Ok(self.related.get(&path).cloned().unwrap_or_default())
    }

    fn client_type(&self) -> &'static str {
        "memory"
    }
}
