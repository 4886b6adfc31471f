//! Report pipeline definitions
//!
//! A pipeline names its source collection and properties, its default
//! client-side predicate, its natural key and its output fields, and turns
//! one source entity into one output record.

mod enterprise_apps;
mod guest_users;
mod intune_apps;

pub use enterprise_apps::EnterpriseApps;
pub use guest_users::GuestUsers;
pub use intune_apps::IntuneApps;

use crate::enricher::EnrichContext;
use crate::error::SyncResult;
use async_trait::async_trait;
use dm_core::{OutputRecord, SourceEntity};
use dm_graph::{DirectoryClient, EntityQuery};
use std::fmt;

/// One fetch -> enrich report
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Short name used in logs and progress
    fn name(&self) -> &'static str;

    /// Property-scoped listing of the source collection
    fn query(&self) -> EntityQuery;

    /// Predicate applied when the config and CLI give none
    fn default_filter(&self) -> Option<&'static str>;

    /// Output field holding the natural key
    fn key_field(&self) -> &'static str;

    /// Output fields in column order
    fn fields(&self) -> &'static [&'static str];

    /// Build the output record for one entity
    async fn enrich(
        &self,
        client: &dyn DirectoryClient,
        entity: &SourceEntity,
        ctx: &EnrichContext,
    ) -> SyncResult<OutputRecord>;
}

/// The available reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Apps,
    Guests,
    IntuneApps,
}

impl PipelineKind {
    pub fn pipeline(self) -> Box<dyn Pipeline> {
        match self {
            PipelineKind::Apps => Box::new(EnterpriseApps),
            PipelineKind::Guests => Box::new(GuestUsers),
            PipelineKind::IntuneApps => Box::new(IntuneApps),
        }
    }

    /// Key under `pipelines:` in dirmirror.yml
    pub fn config_key(self) -> &'static str {
        match self {
            PipelineKind::Apps => "apps",
            PipelineKind::Guests => "guests",
            PipelineKind::IntuneApps => "intune_apps",
        }
    }

    pub fn config(self, config: &dm_core::Config) -> &dm_core::PipelineConfig {
        match self {
            PipelineKind::Apps => &config.pipelines.apps,
            PipelineKind::Guests => &config.pipelines.guests,
            PipelineKind::IntuneApps => &config.pipelines.intune_apps,
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Apps => write!(f, "apps"),
            PipelineKind::Guests => write!(f, "guests"),
            PipelineKind::IntuneApps => write!(f, "intune-apps"),
        }
    }
}

/// Record with the key and title fields every pipeline starts from
fn base_record(entity: &SourceEntity, key_attribute: &str, key_field: &str) -> SyncResult<OutputRecord> {
    let key = entity.natural_key(key_attribute)?;
    let title = entity.display_name().to_string();
    Ok(OutputRecord::new(key.clone(), title.clone())
        .with_field("Title", title)
        .with_field(key_field, key.into_inner()))
}
