//! Configuration types and parsing for dirmirror.yml

use crate::error::{CoreError, CoreResult};
use crate::filter::EntityFilter;
use crate::record::DEFAULT_LIST_DELIMITER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable consulted when `--target` is not given
pub const TARGET_ENV_VAR: &str = "DM_TARGET";

/// Environment variable holding a bearer token when no auth section is given
pub const DEFAULT_TOKEN_ENV: &str = "DM_GRAPH_TOKEN";

/// Main configuration from dirmirror.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory tenant to query
    pub tenant_id: String,

    /// Graph endpoint settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// How to obtain a bearer token
    #[serde(default)]
    pub auth: AuthConfig,

    /// Delimiter for flattened list fields
    #[serde(default = "default_list_delimiter")]
    pub list_delimiter: String,

    /// Per-report settings
    #[serde(default)]
    pub pipelines: PipelinesConfig,

    /// Named destination stores
    #[serde(default)]
    pub sinks: HashMap<String, SinkConfig>,

    /// Named tenant profiles (e.g. dev, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Graph endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    /// Service root, without version
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API version segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Requested page size (`$top`)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_version: default_api_version(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GraphConfig {
    /// `endpoint/api_version` with no trailing slash
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

/// Token acquisition settings.
///
/// Either a pre-issued bearer token read from an environment variable, or the
/// client-credentials grant with the secret read from an environment variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default)]
    pub token_env: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret_env: Option<String>,

    /// Token endpoint root
    #[serde(default = "default_authority")]
    pub authority: String,
}

/// Resolved authentication mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    BearerToken { env: String },
    ClientCredentials { client_id: String, secret_env: String },
}

impl AuthConfig {
    pub fn mode(&self) -> AuthMode {
        match (&self.client_id, &self.client_secret_env) {
            (Some(client_id), Some(secret_env)) => AuthMode::ClientCredentials {
                client_id: client_id.clone(),
                secret_env: secret_env.clone(),
            },
            _ => AuthMode::BearerToken {
                env: self
                    .token_env
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
            },
        }
    }
}

/// Per-report settings for every pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelinesConfig {
    #[serde(default)]
    pub apps: PipelineConfig,

    #[serde(default)]
    pub guests: PipelineConfig,

    #[serde(default)]
    pub intune_apps: PipelineConfig,
}

/// Settings for one report pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Client-side filter replacing the pipeline's default predicate
    #[serde(default)]
    pub filter: Option<String>,

    /// Name of the sink `--sync` writes to
    #[serde(default)]
    pub sink: Option<String>,
}

/// A destination store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(flatten)]
    pub kind: SinkKind,

    /// Store column holding the natural key (defaults to the pipeline's key field)
    #[serde(default)]
    pub key_field: Option<String>,

    /// Output field name -> store column name
    #[serde(default)]
    pub field_map: HashMap<String, String>,
}

/// Store backend and its coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkKind {
    /// A list on a site, reached through the graph API
    Sharepoint {
        /// `hostname:/sites/path` or a site id
        site: String,
        /// List display name or id
        list: String,
    },
    /// A table in a local DuckDB database
    Duckdb {
        #[serde(default = "default_duckdb_path")]
        path: String,
        table: String,
    },
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Sharepoint { site, list } => write!(f, "sharepoint list '{}' on {}", list, site),
            SinkKind::Duckdb { path, table } => write!(f, "duckdb table '{}' in {}", table, path),
        }
    }
}

/// Tenant profile overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Sinks replacing same-named base sinks
    #[serde(default)]
    pub sinks: HashMap<String, SinkConfig>,
}

fn default_endpoint() -> String {
    "https://graph.microsoft.com".to_string()
}

fn default_api_version() -> String {
    "v1.0".to_string()
}

fn default_page_size() -> u32 {
    999
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_list_delimiter() -> String {
    DEFAULT_LIST_DELIMITER.to_string()
}

fn default_duckdb_path() -> String {
    "dirmirror.duckdb".to_string()
}

const MAX_PAGE_SIZE: u32 = 999;

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory.
    /// Looks for dirmirror.yml or dirmirror.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("dirmirror.yml");
        let yaml_path = dir.join("dirmirror.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(invalid("tenant_id cannot be empty"));
        }

        if self.graph.page_size == 0 || self.graph.page_size > MAX_PAGE_SIZE {
            return Err(invalid(format!(
                "graph.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.graph.page_size
            )));
        }

        if self.graph.timeout_secs == 0 {
            return Err(invalid("graph.timeout_secs must be greater than 0"));
        }

        if self.auth.client_id.is_some() != self.auth.client_secret_env.is_some() {
            return Err(invalid(
                "auth.client_id and auth.client_secret_env must be set together",
            ));
        }

        for (name, pipeline) in self.pipelines.iter() {
            if let Some(filter) = &pipeline.filter {
                EntityFilter::parse(filter)?;
            }
            if let Some(sink) = &pipeline.sink {
                if !self.sinks.contains_key(sink) {
                    return Err(invalid(format!(
                        "pipelines.{}.sink refers to unknown sink '{}'. Available sinks: {}",
                        name,
                        sink,
                        self.sink_names().join(", ")
                    )));
                }
            }
        }

        let target_sinks = self
            .targets
            .values()
            .flat_map(|t| t.sinks.iter());
        for (name, sink) in self.sinks.iter().chain(target_sinks) {
            sink.validate(name)?;
        }

        Ok(())
    }

    /// Sorted sink names, for messages
    pub fn sink_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sinks.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Tenant id, with target override applied
    pub fn get_tenant_id(&self, target: Option<&str>) -> &str {
        target
            .and_then(|name| self.targets.get(name))
            .and_then(|tc| tc.tenant_id.as_deref())
            .unwrap_or(&self.tenant_id)
    }

    /// Look up a sink by name, preferring the target's definition.
    pub fn get_sink(&self, name: &str, target: Option<&str>) -> CoreResult<&SinkConfig> {
        if let Some(name_target) = target {
            let target_config = self.targets.get(name_target).ok_or_else(|| {
                let mut available: Vec<&str> = self.targets.keys().map(|k| k.as_str()).collect();
                available.sort_unstable();
                invalid(format!(
                    "Target '{}' not found. Available targets: {}",
                    name_target,
                    available.join(", ")
                ))
            })?;
            if let Some(sink) = target_config.sinks.get(name) {
                return Ok(sink);
            }
        }

        self.sinks.get(name).ok_or_else(|| {
            invalid(format!(
                "Sink '{}' not found. Available sinks: {}",
                name,
                self.sink_names().join(", ")
            ))
        })
    }

    /// Check that a target name exists
    pub fn check_target(&self, target: Option<&str>) -> CoreResult<()> {
        match target {
            Some(name) if !self.targets.contains_key(name) => Err(invalid(format!(
                "Target '{}' not found",
                name
            ))),
            _ => Ok(()),
        }
    }

    /// Resolve target from CLI flag or DM_TARGET environment variable
    ///
    /// Priority: CLI flag > DM_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.trim().is_empty())
    }
}

impl PipelinesConfig {
    /// `(name, config)` pairs using the YAML key names
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PipelineConfig)> {
        [
            ("apps", &self.apps),
            ("guests", &self.guests),
            ("intune_apps", &self.intune_apps),
        ]
        .into_iter()
    }
}

impl SinkConfig {
    fn validate(&self, name: &str) -> CoreResult<()> {
        match &self.kind {
            SinkKind::Sharepoint { site, list } => {
                if site.trim().is_empty() || list.trim().is_empty() {
                    return Err(invalid(format!(
                        "sink '{}': sharepoint sinks need both 'site' and 'list'",
                        name
                    )));
                }
            }
            SinkKind::Duckdb { table, .. } => {
                if !is_plain_identifier(table) {
                    return Err(invalid(format!(
                        "sink '{}': table '{}' must be a plain identifier ([A-Za-z_][A-Za-z0-9_]*)",
                        name, table
                    )));
                }
            }
        }
        if matches!(&self.key_field, Some(k) if k.trim().is_empty()) {
            return Err(invalid(format!("sink '{}': key_field cannot be empty", name)));
        }
        Ok(())
    }

    /// Store column for an output field
    pub fn column_for<'a>(&'a self, field: &'a str) -> &'a str {
        self.field_map.get(field).map(|s| s.as_str()).unwrap_or(field)
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.into(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
