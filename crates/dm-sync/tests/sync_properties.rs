//! End-to-end pipeline and reconciliation properties over in-memory doubles

use dm_core::{ActionKind, FieldValue, NaturalKey};
use dm_graph::InMemoryDirectory;
use dm_store::{DuckDbListStore, InMemoryListStore, ListStore, RowFields};
use dm_sync::pipelines::EnterpriseApps;
use dm_sync::{
    collect_records, resolve_filter, EnrichContext, NoProgress, Pipeline, Reconciler, SinkMapping,
};
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn sp(id: &str, app_id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "appId": app_id,
        "displayName": name,
        "preferredSingleSignOnMode": "saml",
        "appRoleAssignmentRequired": true,
        "keyCredentials": [
            { "usage": "Sign", "endDateTime": "2024-01-01T00:00:00Z" },
            { "usage": "Sign", "endDateTime": "2025-06-01T00:00:00Z" }
        ]
    })
}

fn directory(apps: &[(&str, &str, &str)]) -> InMemoryDirectory {
    let mut entities: Vec<Value> = apps.iter().map(|(id, app, name)| sp(id, app, name)).collect();
    // Filtered out client-side: no SSO configured
    entities.push(json!({
        "id": "sp-x",
        "appId": "app-x",
        "displayName": "Graph Explorer",
        "preferredSingleSignOnMode": null,
        "appRoleAssignmentRequired": true
    }));
    InMemoryDirectory::new().with_collection("servicePrincipals", entities)
}

async fn fresh_records(directory: &InMemoryDirectory) -> Vec<dm_core::OutputRecord> {
    let pipeline = EnterpriseApps;
    let filter = resolve_filter(&pipeline, None).unwrap();
    collect_records(
        &pipeline,
        directory,
        &filter,
        &EnrichContext::default(),
        &NoProgress,
    )
    .await
    .unwrap()
}

fn row(app_id: &str) -> RowFields {
    json!({ "Title": format!("stale {}", app_id), "AppId": app_id })
        .as_object()
        .cloned()
        .unwrap()
}

async fn store_keys(store: &dyn ListStore) -> BTreeSet<String> {
    store
        .list_rows()
        .await
        .unwrap()
        .iter()
        .filter_map(|r| r.key("AppId"))
        .map(NaturalKey::into_inner)
        .collect()
}

fn keys(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_pure_create() {
    let directory = directory(&[("sp-a", "A", "Alpha"), ("sp-b", "B", "Beta")]);
    let store = InMemoryListStore::new("AppId");
    let reconciler = Reconciler::new(&store, SinkMapping::identity("AppId"));

    let summary = reconciler
        .reconcile(fresh_records(&directory).await, &NoProgress)
        .await
        .unwrap();
    assert_eq!((summary.created, summary.updated, summary.deleted), (2, 0, 0));
    assert_eq!(store_keys(&store).await, keys(&["A", "B"]));
}

#[tokio::test]
async fn test_pure_delete() {
    let directory = directory(&[]);
    let store = InMemoryListStore::new("AppId")
        .with_row("1", row("A"))
        .with_row("2", row("B"));
    let reconciler = Reconciler::new(&store, SinkMapping::identity("AppId"));

    let summary = reconciler
        .reconcile(fresh_records(&directory).await, &NoProgress)
        .await
        .unwrap();
    assert_eq!((summary.created, summary.updated, summary.deleted), (0, 0, 2));
    assert!(store_keys(&store).await.is_empty());
}

#[tokio::test]
async fn test_mixed_and_mirror() {
    let directory = directory(&[("sp-b", "B", "Beta"), ("sp-c", "C", "Gamma")]);
    let store = InMemoryListStore::new("AppId")
        .with_row("1", row("A"))
        .with_row("2", row("B"));
    let reconciler = Reconciler::new(&store, SinkMapping::identity("AppId"));

    let records = fresh_records(&directory).await;
    let planned = reconciler.plan(records.clone()).await.unwrap();
    assert_eq!(planned.plan.kind_of("C"), Some(ActionKind::Create));
    assert_eq!(planned.plan.kind_of("B"), Some(ActionKind::Update));
    assert_eq!(planned.plan.kind_of("A"), Some(ActionKind::Delete));

    let summary = reconciler.reconcile(records, &NoProgress).await.unwrap();
    assert!(summary.is_success());
    assert_eq!(store_keys(&store).await, keys(&["B", "C"]));

    // The surviving row was overwritten with fresh values
    let rows = store.snapshot();
    let b = rows.iter().find(|(id, _)| id.as_str() == "2").unwrap();
    assert_eq!(b.1["Title"], "Beta");
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let directory = directory(&[("sp-a", "A", "Alpha"), ("sp-b", "B", "Beta")]);
    let store = InMemoryListStore::new("AppId").with_row("9", row("Z"));
    let reconciler = Reconciler::new(&store, SinkMapping::identity("AppId"));

    reconciler
        .reconcile(fresh_records(&directory).await, &NoProgress)
        .await
        .unwrap();
    let after_first = store.snapshot();

    let second = reconciler
        .reconcile(fresh_records(&directory).await, &NoProgress)
        .await
        .unwrap();
    assert_eq!((second.created, second.deleted), (0, 0));
    assert_eq!(second.updated, 2);
    assert_eq!(store.snapshot(), after_first);
}

#[tokio::test]
async fn test_enrichment_failure_is_isolated() {
    let apps = [
        ("sp-a", "A", "Alpha"),
        ("sp-b", "B", "Beta"),
        ("sp-c", "C", "Gamma"),
    ];
    let clean = fresh_records(&directory(&apps)).await;
    let failing = directory(&apps).fail("servicePrincipals/sp-b/appRoleAssignedTo", 500, "boom");
    let records = fresh_records(&failing).await;

    let titles: Vec<&str> = records.iter().map(|r| r.display()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

    assert!(records[1].get("AssignedGroups").unwrap().is_error_marker());
    assert!(!records[1].get("CertificateExpiry").unwrap().is_error_marker());
    // Neighbours of the failing entity are identical to a clean run
    assert_eq!(records[0], clean[0]);
    assert_eq!(records[2], clean[2]);
}

#[tokio::test]
async fn test_certificate_tie_break() {
    let directory = directory(&[("sp-a", "A", "Alpha")]);
    let records = fresh_records(&directory).await;
    assert_eq!(
        records[0].get("CertificateExpiry").map(FieldValue::render).as_deref(),
        Some("2025-06-01T00:00:00Z")
    );
}

#[tokio::test]
async fn test_duckdb_sink_round() {
    let directory = directory(&[("sp-a", "A", "Alpha"), ("sp-b", "B", "Beta")]);
    let store = DuckDbListStore::in_memory("enterprise_apps").unwrap();
    let reconciler = Reconciler::new(&store, SinkMapping::identity(EnterpriseApps.key_field()));

    let first = reconciler
        .reconcile(fresh_records(&directory).await, &NoProgress)
        .await
        .unwrap();
    assert_eq!(first.created, 2);

    let shrunk = crate::directory(&[("sp-b", "B", "Beta")]);
    let second = reconciler
        .reconcile(fresh_records(&shrunk).await, &NoProgress)
        .await
        .unwrap();
    assert_eq!((second.created, second.updated, second.deleted), (0, 1, 1));
    assert_eq!(store_keys(&store).await, keys(&["B"]));

    let rows = store.list_rows().await.unwrap();
    assert_eq!(rows[0].fields["AssignmentRequired"], true);
    assert_eq!(rows[0].fields["ProvisioningStatus"], "Disabled");
}
