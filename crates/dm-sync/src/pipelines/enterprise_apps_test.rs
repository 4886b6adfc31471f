use super::*;
use chrono::TimeZone;
use dm_graph::InMemoryDirectory;
use serde_json::json;

fn sp(id: &str, app_id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "appId": app_id,
        "displayName": name,
        "preferredSingleSignOnMode": "saml",
        "appRoleAssignmentRequired": true,
        "keyCredentials": [
            { "usage": "Sign", "endDateTime": "2024-01-01T00:00:00Z" },
            { "usage": "Verify", "endDateTime": "2030-01-01T00:00:00Z" },
            { "usage": "Sign", "endDateTime": "2025-06-01T00:00:00Z" }
        ]
    })
}

fn entity(value: Value) -> SourceEntity {
    SourceEntity::from_json(value).unwrap()
}

fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

#[test]
fn test_latest_signing_credential_wins() {
    assert_eq!(
        latest_signing_expiry(&sp("1", "a", "x")),
        Some(utc(2025, 6, 1))
    );
    assert_eq!(latest_signing_expiry(&json!({ "keyCredentials": [] })), None);
    assert_eq!(latest_signing_expiry(&json!({})), None);
}

#[test]
fn test_provisioning_summary_orders_by_job_id() {
    let jobs = vec![
        json!({ "id": "scim.b", "status": { "code": "Paused" } }),
        json!({ "id": "scim.a", "status": {
            "code": "Active",
            "lastSuccessfulExecution": { "timeEnded": "2024-05-01T10:00:00Z" }
        }}),
    ];
    let (status, last) = provisioning_summary(jobs, "; ");
    assert_eq!(status, "Active; Paused");
    assert_eq!(last, Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
}

#[tokio::test]
async fn test_enrich_full_record() {
    let directory = InMemoryDirectory::new()
        .with_collection(COLLECTION, vec![sp("sp-1", "app-1", "Payroll")])
        .with_related(
            COLLECTION,
            "sp-1",
            "appRoleAssignedTo",
            vec![
                json!({ "principalType": "Group", "principalDisplayName": "finance" }),
                json!({ "principalType": "User", "principalDisplayName": "Bob" }),
                json!({ "principalType": "Group", "principalDisplayName": "Accounting" }),
            ],
        )
        .with_related(
            COLLECTION,
            "sp-1",
            "synchronization/jobs",
            vec![json!({ "id": "job-1", "status": { "code": "Active" } })],
        );

    let record = EnterpriseApps
        .enrich(
            &directory,
            &entity(sp("sp-1", "app-1", "Payroll")),
            &EnrichContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(record.key().as_str(), "app-1");
    assert_eq!(record.display(), "Payroll");
    let names: Vec<&str> = record.field_names().collect();
    assert_eq!(names, FIELDS);
    assert_eq!(record.get("SsoMode"), Some(&FieldValue::from("saml")));
    assert_eq!(record.get("AssignmentRequired"), Some(&FieldValue::Bool(true)));
    assert_eq!(
        record.get("AssignedGroups"),
        Some(&FieldValue::from("Accounting; finance"))
    );
    assert_eq!(
        record.get("CertificateExpiry"),
        Some(&FieldValue::Timestamp(utc(2025, 6, 1)))
    );
    assert_eq!(record.get("ProvisioningStatus"), Some(&FieldValue::from("Active")));
    assert_eq!(record.get("LastProvisioned"), Some(&FieldValue::Null));
    assert!(!record.has_errors());
}

#[tokio::test]
async fn test_absent_lookups_use_sentinels() {
    let directory = InMemoryDirectory::new()
        .with_collection(COLLECTION, vec![json!({ "id": "sp-2", "appId": "app-2" })])
        .not_found("servicePrincipals/sp-2/synchronization/jobs");

    let record = EnterpriseApps
        .enrich(
            &directory,
            &entity(json!({ "id": "sp-2", "appId": "app-2" })),
            &EnrichContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(record.display(), "sp-2");
    assert_eq!(record.get("SsoMode"), Some(&FieldValue::Null));
    assert_eq!(record.get("AssignedGroups"), Some(&FieldValue::from("None")));
    assert_eq!(record.get("CertificateExpiry"), Some(&FieldValue::from("None")));
    assert_eq!(record.get("ProvisioningStatus"), Some(&FieldValue::from("Disabled")));
    assert_eq!(record.get("LastProvisioned"), Some(&FieldValue::Null));
}

#[tokio::test]
async fn test_failed_lookup_marks_only_its_fields() {
    let directory = InMemoryDirectory::new()
        .with_collection(COLLECTION, vec![sp("sp-3", "app-3", "CRM")])
        .fail("servicePrincipals/sp-3/synchronization/jobs", 500, "sync service down");

    let record = EnterpriseApps
        .enrich(
            &directory,
            &entity(sp("sp-3", "app-3", "CRM")),
            &EnrichContext::default(),
        )
        .await
        .unwrap();

    assert!(record.has_errors());
    assert!(record.get("ProvisioningStatus").unwrap().is_error_marker());
    assert!(record
        .get("LastProvisioned")
        .unwrap()
        .render()
        .contains("sync service down"));
    assert!(!record.get("CertificateExpiry").unwrap().is_error_marker());
}

#[tokio::test]
async fn test_missing_app_id_is_an_error() {
    let result = EnterpriseApps
        .enrich(
            &InMemoryDirectory::new(),
            &entity(json!({ "id": "sp-4" })),
            &EnrichContext::default(),
        )
        .await;
    assert!(result.is_err());
}

#[test]
fn test_default_filter_parses() {
    let filter = dm_core::EntityFilter::parse(DEFAULT_FILTER).unwrap();
    assert_eq!(filter.clauses().len(), 2);
}
