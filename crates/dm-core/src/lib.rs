//! dm-core - Core library for dirmirror
//!
//! This crate provides the types shared by every report pipeline: strongly
//! typed keys, source entities, flat output records, the client-side filter
//! predicate, the natural-key index and reconciliation plan, and the
//! `dirmirror.yml` configuration.

pub mod config;
pub mod email;
pub mod entity;
pub mod error;
pub mod filter;
pub mod keys;
mod newtype_string;
pub mod plan;
pub mod record;
pub mod time;

pub use config::{
    AuthConfig, AuthMode, Config, GraphConfig, PipelineConfig, PipelinesConfig, SinkConfig,
    SinkKind, TargetConfig,
};
pub use entity::SourceEntity;
pub use error::{CoreError, CoreResult};
pub use filter::EntityFilter;
pub use keys::{EntityId, NaturalKey, RowId};
pub use plan::{ActionKind, DuplicateKey, KeyIndex, PlanAction, ReconciliationPlan};
pub use record::{join_sorted, DestinationRecord, FieldValue, OutputRecord};
