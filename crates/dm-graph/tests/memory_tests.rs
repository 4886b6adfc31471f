//! InMemoryDirectory behavior the pipeline tests rely on

use dm_graph::{DirectoryClient, EntityQuery, InMemoryDirectory};
use serde_json::json;

#[tokio::test]
async fn test_server_filter_and_point_lookup() {
    let directory = InMemoryDirectory::new().with_collection(
        "users",
        vec![
            json!({"id": "u1", "userType": "Guest"}),
            json!({"id": "u2", "userType": "Member"}),
        ],
    );

    let guests = directory
        .list(&EntityQuery::new("users").filter("userType eq 'Guest'"))
        .await
        .unwrap();
    assert_eq!(guests.len(), 1);

    let member = directory.get_entity("users", "u2", &[]).await.unwrap();
    assert_eq!(member["userType"], "Member");
    assert!(directory.get_entity("users", "u3", &[]).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_injected_failures_and_call_log() {
    let directory = InMemoryDirectory::new()
        .with_related("groups", "g1", "members", vec![json!({"id": "u1"})])
        .not_found("servicePrincipals/sp1/synchronization/jobs")
        .fail("users/u1/memberOf", 500, "boom");

    assert_eq!(
        directory
            .list_related("groups", "g1", "members", &[])
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(directory
        .list_related("servicePrincipals", "sp1", "synchronization", &[])
        .await
        .unwrap()
        .is_empty());
    assert!(directory
        .list_related("servicePrincipals", "sp1", "synchronization/jobs", &[])
        .await
        .unwrap_err()
        .is_not_found());
    let err = directory
        .list_related("users", "u1", "memberOf", &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("boom"));

    assert_eq!(directory.calls().len(), 4);
}
