//! Init command implementation - writes a starter dirmirror.yml

use anyhow::{Context, Result};
use std::fs;

use crate::cli::InitArgs;

const CONFIG_FILE: &str = "dirmirror.yml";

const STARTER_CONFIG: &str = r#"# dirmirror configuration

# Directory tenant (id or verified domain)
tenant_id: "00000000-0000-0000-0000-000000000000"

graph:
  endpoint: https://graph.microsoft.com
  api_version: v1.0
  page_size: 999
  timeout_secs: 60

# Either export a bearer token in DM_GRAPH_TOKEN (or the variable named by
# token_env), or use an app registration with the client-credentials grant.
auth:
  token_env: DM_GRAPH_TOKEN
  # client_id: "11111111-1111-1111-1111-111111111111"
  # client_secret_env: DM_CLIENT_SECRET

# Separator for multi-value fields (groups, assignments)
list_delimiter: "; "

pipelines:
  apps:
    sink: apps_local
    # filter: "appRoleAssignmentRequired eq true"
  guests:
    sink: guests_local
  intune_apps: {}

sinks:
  apps_local:
    type: duckdb
    path: dirmirror.duckdb
    table: enterprise_apps
  guests_local:
    type: duckdb
    path: dirmirror.duckdb
    table: guest_users
  # apps_list:
  #   type: sharepoint
  #   site: contoso.sharepoint.com:/sites/it
  #   list: Enterprise Applications
  #   key_field: ApplicationId
  #   field_map:
  #     AppId: ApplicationId

# targets:
#   prod:
#     tenant_id: "22222222-2222-2222-2222-222222222222"
"#;

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs) -> Result<()> {
    let path = args.dir.join(CONFIG_FILE);

    if path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("Failed to create directory: {}", args.dir.display()))?;
    fs::write(&path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Created {}", path.display());
    println!("\nNext steps:");
    println!("  1. Set tenant_id and the auth section");
    println!("  2. export DM_GRAPH_TOKEN=<token>");
    println!("  3. dm apps");

    Ok(())
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
