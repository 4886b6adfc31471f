//! Per-entity enrichment driver
//!
//! Each entity is enriched independently. A lookup that fails only marks the
//! affected fields of that entity's record; the pass always continues with
//! the next entity.

use crate::pipelines::Pipeline;
use crate::progress::ProgressSink;
use dm_core::record::DEFAULT_LIST_DELIMITER;
use dm_core::{FieldValue, OutputRecord, SourceEntity};
use dm_graph::{DirectoryClient, GraphResult};

/// Settings shared by every enrichment call of a run
#[derive(Debug, Clone)]
pub struct EnrichContext {
    /// Separator for flattened list fields
    pub delimiter: String,
}

impl Default for EnrichContext {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_LIST_DELIMITER.to_string(),
        }
    }
}

/// Outcome of an auxiliary lookup
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    /// The resource does not exist (404)
    Absent,
    /// Any other failure, with its message
    Failed(String),
}

impl<T> Lookup<T> {
    /// Classify a lookup result, logging unexpected failures against `entity`
    pub fn classify(result: GraphResult<T>, entity: &SourceEntity, what: &str) -> Self {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(e) if e.is_not_found() => {
                log::debug!("{} for {}: not found", what, entity.id);
                Lookup::Absent
            }
            Err(e) => {
                log::warn!("{} lookup failed for {}: {}", what, entity.display_name(), e);
                Lookup::Failed(e.to_string())
            }
        }
    }

    /// Render as a field: found values through `f`, absence as `sentinel`,
    /// failure as an error marker
    pub fn render(self, sentinel: &str, f: impl FnOnce(T) -> FieldValue) -> FieldValue {
        match self {
            Lookup::Found(value) => f(value),
            Lookup::Absent => FieldValue::from(sentinel),
            Lookup::Failed(message) => FieldValue::error(message),
        }
    }
}

/// Enrich every entity in order, reporting progress per entity.
///
/// Entities whose record cannot be built at all (no natural key) are
/// skipped with a warning.
pub async fn enrich_all(
    pipeline: &dyn Pipeline,
    client: &dyn DirectoryClient,
    entities: &[SourceEntity],
    ctx: &EnrichContext,
    progress: &dyn ProgressSink,
) -> Vec<OutputRecord> {
    progress.start(entities.len(), pipeline.name());
    let mut records = Vec::with_capacity(entities.len());
    let mut with_errors = 0usize;

    for entity in entities {
        match pipeline.enrich(client, entity, ctx).await {
            Ok(record) => {
                if record.has_errors() {
                    with_errors += 1;
                }
                records.push(record);
            }
            Err(e) => log::warn!("Skipping {}: {}", entity.display_name(), e),
        }
        progress.advance(entity.display_name());
    }

    progress.finish();
    if with_errors > 0 {
        log::warn!(
            "{} of {} record(s) carry lookup errors",
            with_errors,
            records.len()
        );
    }
    records
}

/// Order records by display key (case-insensitive), then natural key
pub fn sort_records(records: &mut [OutputRecord]) {
    records.sort_by(|a, b| {
        a.display()
            .to_lowercase()
            .cmp(&b.display().to_lowercase())
            .then_with(|| a.key().cmp(b.key()))
    });
}

#[cfg(test)]
#[path = "enricher_test.rs"]
mod tests;
