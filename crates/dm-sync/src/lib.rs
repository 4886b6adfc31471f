//! dm-sync - Report pipelines for dirmirror
//!
//! Every report is a linear fetch -> enrich -> output/reconcile pipeline.
//! This crate holds the fetcher, the per-entity enrichment driver, the
//! concrete pipelines, CSV/JSON export and the reconciler that mirrors
//! records into a list store.

pub mod enricher;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod pipelines;
pub mod progress;
pub mod reconciler;
pub mod runner;

pub use enricher::{enrich_all, EnrichContext, Lookup};
pub use error::{SyncError, SyncResult};
pub use export::{export_to_path, write_csv, write_json, ExportFormat};
pub use fetcher::fetch_source_entities;
pub use pipelines::{Pipeline, PipelineKind};
pub use progress::{NoProgress, ProgressSink};
pub use reconciler::{ApplyFailure, PlannedSync, ReconcileSummary, Reconciler, SinkMapping};
pub use runner::{collect_records, resolve_filter};
