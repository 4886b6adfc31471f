//! Source entity fetching

use crate::error::{SyncError, SyncResult};
use dm_core::{CoreResult, EntityFilter, SourceEntity};
use dm_graph::{DirectoryClient, EntityQuery};

/// Fetch every entity of the query's collection and keep those matching `filter`.
///
/// Fields the filter reads are added to a non-empty `$select` so the
/// predicate never sees a property the server was not asked for. Any remote
/// failure aborts the fetch; no partial result is returned.
pub async fn fetch_source_entities(
    client: &dyn DirectoryClient,
    query: &EntityQuery,
    filter: &EntityFilter,
) -> SyncResult<Vec<SourceEntity>> {
    let query = scoped_query(query, filter);
    let raw = client.list(&query).await.map_err(|e| SyncError::Fetch {
        collection: query.collection.clone(),
        source: e,
    })?;
    let fetched = raw.len();

    let entities = raw
        .into_iter()
        .map(SourceEntity::from_json)
        .collect::<CoreResult<Vec<_>>>()?;
    let kept: Vec<SourceEntity> = entities.into_iter().filter(|e| filter.matches(e)).collect();

    log::info!(
        "{}: fetched {}, {} after filter",
        query.collection,
        fetched,
        kept.len()
    );
    Ok(kept)
}

fn scoped_query(query: &EntityQuery, filter: &EntityFilter) -> EntityQuery {
    let mut scoped = query.clone();
    if scoped.select.is_empty() {
        return scoped;
    }
    for clause in filter.clauses() {
        let root = clause.field.split('/').next().unwrap_or(&clause.field);
        // Annotations such as @odata.type come back unselected and are not selectable
        if root.starts_with('@') {
            continue;
        }
        if !scoped.select.iter().any(|s| s.eq_ignore_ascii_case(root)) {
            scoped.select.push(root.to_string());
        }
    }
    scoped
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
