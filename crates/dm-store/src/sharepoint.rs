//! Site list reached through the graph API

use crate::error::{StoreError, StoreResult};
use crate::traits::{ListStore, RowFields};
use async_trait::async_trait;
use dm_core::{DestinationRecord, RowId};
use dm_graph::{GraphClient, GraphError};
use serde_json::{json, Value};
use std::sync::Arc;

/// A list on a site, addressed as `sites/{site-id}/lists/{list-id}/items`
pub struct SharePointListStore {
    client: Arc<GraphClient>,
    site: String,
    list: String,
    items_path: String,
}

impl SharePointListStore {
    /// Resolve the site and list; either missing is a fatal error
    pub async fn connect(client: Arc<GraphClient>, site: &str, list: &str) -> StoreResult<Self> {
        let site_doc = client
            .get_json(&format!("sites/{}", site), &[("$select", "id".to_string())])
            .await
            .map_err(|e| not_found_as(e, format!("site '{}'", site)))?;
        let site_id = site_doc
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::MalformedRow(format!("site '{}' has no id", site)))?
            .to_string();

        let lists = client
            .get_all(
                &format!("sites/{}/lists", site_id),
                &[("$select", "id,name,displayName".to_string())],
            )
            .await
            .map_err(|e| not_found_as(e, format!("site '{}'", site)))?;

        let list_id = lists
            .iter()
            .find(|l| list_matches(l, list))
            .and_then(|l| l.get("id").and_then(Value::as_str))
            .ok_or_else(|| {
                StoreError::DestinationNotFound(format!("list '{}' on site '{}'", list, site))
            })?
            .to_string();

        log::debug!("Resolved list '{}' to {} on site {}", list, list_id, site_id);

        Ok(Self {
            client,
            site: site.to_string(),
            list: list.to_string(),
            items_path: format!("sites/{}/lists/{}/items", site_id, list_id),
        })
    }
}

fn list_matches(candidate: &Value, wanted: &str) -> bool {
    ["id", "name", "displayName"].iter().any(|field| {
        candidate
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|v| v.eq_ignore_ascii_case(wanted))
    })
}

fn not_found_as(err: GraphError, what: String) -> StoreError {
    if err.is_not_found() {
        StoreError::DestinationNotFound(what)
    } else {
        StoreError::Remote(err)
    }
}

fn row_id_of(item: &Value) -> StoreResult<RowId> {
    let raw = match item.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(StoreError::MalformedRow("list item has no id".to_string())),
    };
    RowId::try_new(&raw).ok_or_else(|| StoreError::MalformedRow("list item has a blank id".to_string()))
}

#[async_trait]
impl ListStore for SharePointListStore {
    async fn list_rows(&self) -> StoreResult<Vec<DestinationRecord>> {
        let items = self
            .client
            .get_all(&self.items_path, &[("$expand", "fields".to_string())])
            .await?;

        items
            .iter()
            .map(|item| {
                let row_id = row_id_of(item)?;
                let fields = match item.get("fields") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => RowFields::new(),
                };
                Ok(DestinationRecord::new(row_id, fields))
            })
            .collect()
    }

    async fn create_row(&self, fields: &RowFields) -> StoreResult<RowId> {
        let created = self
            .client
            .post_json(&self.items_path, &json!({ "fields": fields }))
            .await?;
        row_id_of(&created)
    }

    async fn update_row(&self, row_id: &RowId, fields: &RowFields) -> StoreResult<()> {
        self.client
            .patch_json(
                &format!("{}/{}/fields", self.items_path, row_id),
                &Value::Object(fields.clone()),
            )
            .await
            .map_err(|e| row_error(e, row_id))
    }

    async fn delete_row(&self, row_id: &RowId) -> StoreResult<()> {
        self.client
            .delete(&format!("{}/{}", self.items_path, row_id))
            .await
            .map_err(|e| row_error(e, row_id))
    }

    fn store_type(&self) -> &'static str {
        "sharepoint"
    }

    fn describe(&self) -> String {
        format!("list '{}' on {}", self.list, self.site)
    }
}

fn row_error(err: GraphError, row_id: &RowId) -> StoreError {
    if err.is_not_found() {
        StoreError::RowNotFound(row_id.to_string())
    } else {
        StoreError::Remote(err)
    }
}
