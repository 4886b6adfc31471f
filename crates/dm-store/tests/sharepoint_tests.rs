//! SharePointListStore against a mock graph endpoint

use dm_core::RowId;
use dm_graph::{GraphClient, StaticToken};
use dm_store::{ListStore, RowFields, SharePointListStore, StoreError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "contoso.sharepoint.com:/sites/it";
const SITE_ID: &str = "contoso.sharepoint.com,site-guid,web-guid";

fn client(server: &MockServer) -> Arc<GraphClient> {
    Arc::new(
        GraphClient::new(
            format!("{}/v1.0", server.uri()),
            Arc::new(StaticToken::new("t")),
            Duration::from_secs(5),
            999,
        )
        .unwrap(),
    )
}

async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/sites/{}", SITE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": SITE_ID })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/v1.0/sites/{}/lists", SITE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "list-1", "name": "Tasks", "displayName": "Tasks" },
                { "id": "list-2", "name": "EnterpriseApplications", "displayName": "Enterprise Applications" }
            ]
        })))
        .mount(server)
        .await;
}

fn items_path() -> String {
    format!("/v1.0/sites/{}/lists/list-2/items", SITE_ID)
}

fn fields(value: Value) -> RowFields {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_connect_and_list_rows() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    Mock::given(method("GET"))
        .and(path(items_path()))
        .and(query_param("$expand", "fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "1", "fields": { "Title": "Payroll", "AppId": "a-1" } },
                { "id": "2", "fields": { "Title": "CRM" } }
            ]
        })))
        .mount(&server)
        .await;

    let store = SharePointListStore::connect(client(&server), SITE, "enterprise applications")
        .await
        .unwrap();
    assert_eq!(store.store_type(), "sharepoint");

    let rows = store.list_rows().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].row_id.as_str(), "1");
    assert_eq!(rows[0].key("AppId").unwrap().as_str(), "a-1");
    assert!(rows[1].key("AppId").is_none());
}

#[tokio::test]
async fn test_writes() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let row = fields(json!({ "Title": "Payroll", "AppId": "a-1" }));

    Mock::given(method("POST"))
        .and(path(items_path()))
        .and(body_json(json!({ "fields": { "Title": "Payroll", "AppId": "a-1" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "17" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/17/fields", items_path())))
        .and(body_json(json!({ "Title": "Payroll", "AppId": "a-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/17", items_path())))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = SharePointListStore::connect(client(&server), SITE, "list-2")
        .await
        .unwrap();
    let id = store.create_row(&row).await.unwrap();
    assert_eq!(id.as_str(), "17");
    store.update_row(&id, &row).await.unwrap();
    store.delete_row(&id).await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_row() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/99", items_path())))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = SharePointListStore::connect(client(&server), SITE, "Enterprise Applications")
        .await
        .unwrap();
    let err = store
        .delete_row(&RowId::try_new("99").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::RowNotFound(_)));
}

#[tokio::test]
async fn test_unknown_list_is_fatal() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let err = SharePointListStore::connect(client(&server), SITE, "Nope")
        .await
        .err().unwrap();
    assert!(matches!(err, StoreError::DestinationNotFound(_)));
    assert!(err.to_string().contains("'Nope'"));
}

#[tokio::test]
async fn test_unknown_site_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/sites/missing.example.com"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = SharePointListStore::connect(client(&server), "missing.example.com", "Apps")
        .await
        .err().unwrap();
    assert!(matches!(err, StoreError::DestinationNotFound(_)));
}
