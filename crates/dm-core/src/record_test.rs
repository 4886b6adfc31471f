use super::*;
use chrono::TimeZone;
use serde_json::json;

fn key(s: &str) -> NaturalKey {
    NaturalKey::try_new(s).unwrap()
}

#[test]
fn test_set_replaces_in_place() {
    let mut record = OutputRecord::new(key("a"), "Alpha")
        .with_field("Title", "Alpha")
        .with_field("Status", "Active");
    record.set("Title", "Renamed");

    let names: Vec<&str> = record.field_names().collect();
    assert_eq!(names, vec!["Title", "Status"]);
    assert_eq!(record.get("Title"), Some(&FieldValue::from("Renamed")));
}

#[test]
fn test_error_marker_detection() {
    let record = OutputRecord::new(key("a"), "Alpha")
        .with_field("Groups", FieldValue::error("403 Forbidden"));
    assert!(record.has_errors());
    assert_eq!(
        record.get("Groups").unwrap().render(),
        "Error: 403 Forbidden"
    );
}

#[test]
fn test_render_and_json() {
    let ts = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(FieldValue::from(ts).render(), "2025-06-01T00:00:00Z");
    assert_eq!(FieldValue::from(true).render(), "True");
    assert_eq!(FieldValue::from(None::<String>).render(), "");
    assert_eq!(FieldValue::from(false).to_json(), json!(false));
    assert_eq!(FieldValue::Null.to_json(), Value::Null);
}

#[test]
fn test_record_serializes_as_ordered_object() {
    let record = OutputRecord::new(key("app-1"), "Payroll")
        .with_field("Title", "Payroll")
        .with_field("AppId", "app-1")
        .with_field("AssignmentRequired", true);
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(
        json,
        r#"{"Title":"Payroll","AppId":"app-1","AssignmentRequired":true}"#
    );
}

#[test]
fn test_destination_key() {
    let mut fields = Map::new();
    fields.insert("AppId".to_string(), json!("app-1"));
    fields.insert("Count".to_string(), json!(7));
    let row = DestinationRecord::new(RowId::try_new("1").unwrap(), fields);
    assert_eq!(row.key("AppId").unwrap(), "app-1");
    assert_eq!(row.key("Count").unwrap(), "7");
    assert!(row.key("Missing").is_none());
}

#[test]
fn test_join_sorted_is_stable() {
    let joined = join_sorted(["beta", "Alpha", " ", "alpha", "beta"], "; ");
    assert_eq!(joined, "Alpha; alpha; beta");
    assert_eq!(join_sorted(Vec::<String>::new(), ", "), "");
}
