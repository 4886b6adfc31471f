use super::*;
use serde_json::json;

fn entity(value: serde_json::Value) -> SourceEntity {
    SourceEntity::from_json(value).unwrap()
}

const APPS_FILTER: &str =
    "preferredSingleSignOnMode in (saml, oidc, password, linked) and appRoleAssignmentRequired eq true";

#[test]
fn test_parse_default_apps_filter() {
    let filter = EntityFilter::parse(APPS_FILTER).unwrap();
    assert_eq!(filter.clauses().len(), 2);
    assert_eq!(filter.clauses()[0].field, "preferredSingleSignOnMode");
    assert_eq!(
        filter.clauses()[1].comparison,
        Comparison::Eq(Literal::Bool(true))
    );
}

#[test]
fn test_apps_filter_matches() {
    let filter = EntityFilter::parse(APPS_FILTER).unwrap();

    let saml = entity(json!({
        "id": "1",
        "preferredSingleSignOnMode": "SAML",
        "appRoleAssignmentRequired": true
    }));
    let not_required = entity(json!({
        "id": "2",
        "preferredSingleSignOnMode": "saml",
        "appRoleAssignmentRequired": false
    }));
    let no_sso = entity(json!({
        "id": "3",
        "preferredSingleSignOnMode": null,
        "appRoleAssignmentRequired": true
    }));

    assert!(filter.matches(&saml));
    assert!(!filter.matches(&not_required));
    assert!(!filter.matches(&no_sso));
}

#[test]
fn test_blank_filter_matches_everything() {
    let filter = EntityFilter::parse("   ").unwrap();
    assert!(filter.is_empty());
    assert!(filter.matches(&entity(json!({ "id": "x" }))));
}

#[test]
fn test_null_and_missing_fields() {
    let filter = EntityFilter::parse("signInActivity/lastSignInDateTime eq null").unwrap();
    assert!(filter.matches(&entity(json!({ "id": "1" }))));
    assert!(filter.matches(&entity(json!({ "id": "2", "signInActivity": null }))));
    assert!(!filter.matches(&entity(json!({
        "id": "3",
        "signInActivity": { "lastSignInDateTime": "2024-01-01T00:00:00Z" }
    }))));
}

#[test]
fn test_ne_and_quoted_values() {
    let filter = EntityFilter::parse("displayName ne 'O''Brien Tools'").unwrap();
    assert!(!filter.matches(&entity(json!({ "id": "1", "displayName": "o'brien tools" }))));
    assert!(filter.matches(&entity(json!({ "id": "2", "displayName": "Payroll" }))));
}

#[test]
fn test_array_attribute_matches_any_element() {
    let filter = EntityFilter::parse("tags in (HideApp, WindowsAzureActiveDirectoryIntegratedApp)")
        .unwrap();
    assert!(filter.matches(&entity(json!({ "id": "1", "tags": ["hideapp", "other"] }))));
    assert!(!filter.matches(&entity(json!({ "id": "2", "tags": [] }))));
}

#[test]
fn test_number_comparison() {
    let filter = EntityFilter::parse("version eq 2").unwrap();
    assert!(filter.matches(&entity(json!({ "id": "1", "version": 2 }))));
    assert!(!filter.matches(&entity(json!({ "id": "1", "version": 3 }))));
}

#[test]
fn test_parse_errors() {
    for bad in [
        "field",
        "field gt 3",
        "field eq",
        "field in saml",
        "field in (saml",
        "a eq 1 or b eq 2",
        "a eq 1 and",
        "a eq 'open",
    ] {
        assert!(
            matches!(EntityFilter::parse(bad), Err(CoreError::InvalidFilter { .. })),
            "expected parse error for {bad:?}"
        );
    }
}

#[test]
fn test_display_round_trips_through_parse() {
    let filter = EntityFilter::parse("mode IN ( saml,'Pass word' ) AND enabled EQ TRUE").unwrap();
    let rendered = filter.to_string();
    assert_eq!(rendered, "mode in ('saml', 'Pass word') and enabled eq true");
    assert_eq!(EntityFilter::parse(&rendered).unwrap(), filter);
}
