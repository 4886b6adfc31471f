//! Enterprise applications: service principals with SSO and required assignment

use super::{base_record, Pipeline};
use crate::enricher::{EnrichContext, Lookup};
use crate::error::SyncResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dm_core::entity::lookup_value;
use dm_core::time::parse_utc;
use dm_core::{join_sorted, FieldValue, OutputRecord, SourceEntity};
use dm_graph::{DirectoryClient, EntityQuery};
use serde_json::Value;

const COLLECTION: &str = "servicePrincipals";

pub const DEFAULT_FILTER: &str =
    "preferredSingleSignOnMode in (saml, oidc, password, linked) and appRoleAssignmentRequired eq true";

const FIELDS: &[&str] = &[
    "Title",
    "AppId",
    "SsoMode",
    "AssignmentRequired",
    "AssignedGroups",
    "CertificateExpiry",
    "ProvisioningStatus",
    "LastProvisioned",
];

pub struct EnterpriseApps;

#[async_trait]
impl Pipeline for EnterpriseApps {
    fn name(&self) -> &'static str {
        "apps"
    }

    fn query(&self) -> EntityQuery {
        EntityQuery::new(COLLECTION).select([
            "id",
            "appId",
            "displayName",
            "preferredSingleSignOnMode",
            "appRoleAssignmentRequired",
        ])
    }

    fn default_filter(&self) -> Option<&'static str> {
        Some(DEFAULT_FILTER)
    }

    fn key_field(&self) -> &'static str {
        "AppId"
    }

    fn fields(&self) -> &'static [&'static str] {
        FIELDS
    }

    async fn enrich(
        &self,
        client: &dyn DirectoryClient,
        entity: &SourceEntity,
        ctx: &EnrichContext,
    ) -> SyncResult<OutputRecord> {
        let id = entity.id.as_str();
        let mut record = base_record(entity, "appId", "AppId")?
            .with_field(
                "SsoMode",
                entity.str_attr("preferredSingleSignOnMode").map(str::to_string),
            )
            .with_field(
                "AssignmentRequired",
                entity.bool_attr("appRoleAssignmentRequired"),
            );

        let assignments = Lookup::classify(
            client
                .list_related(
                    COLLECTION,
                    id,
                    "appRoleAssignedTo",
                    &["principalType", "principalDisplayName"],
                )
                .await,
            entity,
            "assignments",
        );
        record.set(
            "AssignedGroups",
            assignments.render("None", |items| {
                none_if_empty(join_sorted(assigned_group_names(&items), &ctx.delimiter))
            }),
        );

        let credentials = Lookup::classify(
            client.get_entity(COLLECTION, id, &["keyCredentials"]).await,
            entity,
            "certificates",
        );
        record.set(
            "CertificateExpiry",
            credentials.render("None", |sp| match latest_signing_expiry(&sp) {
                Some(expiry) => FieldValue::Timestamp(expiry),
                None => FieldValue::from("None"),
            }),
        );

        match Lookup::classify(
            client
                .list_related(COLLECTION, id, "synchronization/jobs", &[])
                .await,
            entity,
            "provisioning",
        ) {
            Lookup::Found(jobs) if !jobs.is_empty() => {
                let (status, last) = provisioning_summary(jobs, &ctx.delimiter);
                record.set("ProvisioningStatus", status);
                record.set("LastProvisioned", last);
            }
            Lookup::Found(_) | Lookup::Absent => {
                record.set("ProvisioningStatus", "Disabled");
                record.set("LastProvisioned", FieldValue::Null);
            }
            Lookup::Failed(message) => {
                record.set("ProvisioningStatus", FieldValue::error(&message));
                record.set("LastProvisioned", FieldValue::error(&message));
            }
        }

        Ok(record)
    }
}

fn none_if_empty(joined: String) -> FieldValue {
    if joined.is_empty() {
        FieldValue::from("None")
    } else {
        FieldValue::Text(joined)
    }
}

/// Display names of group principals among app-role assignments
fn assigned_group_names(assignments: &[Value]) -> Vec<&str> {
    assignments
        .iter()
        .filter(|a| {
            a.get("principalType")
                .and_then(Value::as_str)
                .is_some_and(|t| t.eq_ignore_ascii_case("Group"))
        })
        .filter_map(|a| a.get("principalDisplayName").and_then(Value::as_str))
        .collect()
}

/// Expiry of the signing credential that expires last
pub(crate) fn latest_signing_expiry(service_principal: &Value) -> Option<DateTime<Utc>> {
    service_principal
        .get("keyCredentials")?
        .as_array()?
        .iter()
        .filter(|c| {
            c.get("usage")
                .and_then(Value::as_str)
                .is_some_and(|u| u.eq_ignore_ascii_case("Sign"))
        })
        .filter_map(|c| c.get("endDateTime").and_then(Value::as_str).and_then(parse_utc))
        .max()
}

/// Job status codes in job-id order, and the latest successful run across jobs
pub(crate) fn provisioning_summary(
    mut jobs: Vec<Value>,
    delimiter: &str,
) -> (String, Option<DateTime<Utc>>) {
    jobs.sort_by(|a, b| job_id(a).cmp(job_id(b)));

    let status = jobs
        .iter()
        .map(|job| {
            lookup_value(job, "status/code")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
        })
        .collect::<Vec<_>>()
        .join(delimiter);

    let last = jobs
        .iter()
        .filter_map(|job| {
            lookup_value(job, "status/lastSuccessfulExecution/timeEnded")
                .and_then(Value::as_str)
                .and_then(parse_utc)
        })
        .max();

    (status, last)
}

fn job_id(job: &Value) -> &str {
    job.get("id").and_then(Value::as_str).unwrap_or("")
}

#[cfg(test)]
#[path = "enterprise_apps_test.rs"]
mod tests;
