//! Fetch -> enrich for one pipeline

use crate::enricher::{enrich_all, sort_records, EnrichContext};
use crate::error::SyncResult;
use crate::fetcher::fetch_source_entities;
use crate::pipelines::Pipeline;
use crate::progress::ProgressSink;
use dm_core::{EntityFilter, OutputRecord};
use dm_graph::DirectoryClient;

/// Resolve the predicate for a run: an explicit expression wins over the
/// pipeline's default; neither means every entity.
pub fn resolve_filter(
    pipeline: &dyn Pipeline,
    expression: Option<&str>,
) -> SyncResult<EntityFilter> {
    match expression.or(pipeline.default_filter()) {
        Some(expr) => Ok(EntityFilter::parse(expr)?),
        None => Ok(EntityFilter::all()),
    }
}

/// Fetch, filter and enrich; records come back ordered by display key.
pub async fn collect_records(
    pipeline: &dyn Pipeline,
    client: &dyn DirectoryClient,
    filter: &EntityFilter,
    ctx: &EnrichContext,
    progress: &dyn ProgressSink,
) -> SyncResult<Vec<OutputRecord>> {
    let entities = fetch_source_entities(client, &pipeline.query(), filter).await?;
    let mut records = enrich_all(pipeline, client, &entities, ctx, progress).await;
    sort_records(&mut records);
    Ok(records)
}
