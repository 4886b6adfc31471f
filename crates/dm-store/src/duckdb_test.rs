use super::*;
use serde_json::json;
use tempfile::TempDir;

fn fields(app_id: &str, title: &str) -> RowFields {
    match json!({ "AppId": app_id, "Title": title, "AssignmentRequired": true }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_in_memory() {
    let store = DuckDbListStore::in_memory("apps").unwrap();
    assert_eq!(store.store_type(), "duckdb");
    assert!(store.list_rows().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_update_delete() {
    let store = DuckDbListStore::in_memory("apps").unwrap();

    let id = store.create_row(&fields("a-1", "Payroll")).await.unwrap();
    assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());

    store
        .update_row(&id, &fields("a-1", "Payroll (EU)"))
        .await
        .unwrap();
    let rows = store.list_rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields["Title"], "Payroll (EU)");
    assert_eq!(rows[0].fields["AssignmentRequired"], true);
    assert_eq!(rows[0].key("AppId").unwrap().as_str(), "a-1");

    store.delete_row(&id).await.unwrap();
    assert!(store.list_rows().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_row_is_reported() {
    let store = DuckDbListStore::in_memory("apps").unwrap();
    let ghost = RowId::try_new("no-such-row").unwrap();
    assert!(matches!(
        store.update_row(&ghost, &fields("x", "x")).await,
        Err(StoreError::RowNotFound(_))
    ));
    assert!(matches!(
        store.delete_row(&ghost).await,
        Err(StoreError::RowNotFound(_))
    ));
}

#[tokio::test]
async fn test_rows_persist_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mirror.duckdb");
    {
        let store = DuckDbListStore::from_path(&path, "guests").unwrap();
        store.create_row(&fields("g-1", "Alice")).await.unwrap();
    }
    let reopened = DuckDbListStore::new(path.to_str().unwrap(), "guests").unwrap();
    assert_eq!(reopened.list_rows().await.unwrap().len(), 1);
    assert!(reopened.describe().contains("guests"));
}
