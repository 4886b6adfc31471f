//! Runtime context for CLI commands

use anyhow::{Context, Result};
use dm_core::{Config, SinkConfig, SinkKind};
use dm_graph::GraphClient;
use dm_store::{DuckDbListStore, ListStore, SharePointListStore};
use dm_sync::EnrichContext;
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Loaded config, selected target and an authenticated graph client
pub(crate) struct RuntimeContext {
    pub config: Config,
    pub target: Option<String>,
    pub client: Arc<GraphClient>,
}

impl RuntimeContext {
    /// Load config, resolve the target and build the client.
    ///
    /// Missing credentials fail here, before any request is made.
    pub(crate) fn new(args: &GlobalArgs) -> Result<Self> {
        let config = load_config(args)?;
        let target = Config::resolve_target(args.target.as_deref());
        config.check_target(target.as_deref())?;
        if let Some(name) = &target {
            log::info!("Using target '{}'", name);
        }

        let client = GraphClient::from_config(&config, target.as_deref())
            .context("Failed to set up the graph client")?;
        log::debug!("Graph endpoint: {}", client.base_url());

        Ok(Self {
            config,
            target,
            client: Arc::new(client),
        })
    }

    pub(crate) fn enrich_context(&self) -> EnrichContext {
        EnrichContext {
            delimiter: self.config.list_delimiter.clone(),
        }
    }

    /// Connect to the store a sink definition points at
    pub(crate) async fn open_sink(&self, sink: &SinkConfig) -> Result<Box<dyn ListStore>> {
        let store: Box<dyn ListStore> = match &sink.kind {
            SinkKind::Sharepoint { site, list } => Box::new(
                SharePointListStore::connect(Arc::clone(&self.client), site, list)
                    .await
                    .with_context(|| format!("Failed to open list '{}' on site '{}'", list, site))?,
            ),
            SinkKind::Duckdb { path, table } => Box::new(
                DuckDbListStore::new(path, table)
                    .with_context(|| format!("Failed to open DuckDB table '{}' in {}", table, path))?,
            ),
        };
        log::info!("Sink: {} ({})", store.describe(), store.store_type());
        Ok(store)
    }
}

/// Config from `--config`, or dirmirror.yml in the current directory
pub(crate) fn load_config(args: &GlobalArgs) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load configuration file {}", path)),
        None => Config::load_from_dir(Path::new(".")).context("Failed to load configuration"),
    }
}
