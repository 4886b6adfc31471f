//! Managed applications and their assignments

use super::{base_record, Pipeline};
use crate::enricher::{EnrichContext, Lookup};
use crate::error::SyncResult;
use async_trait::async_trait;
use dm_core::entity::lookup_value;
use dm_core::{join_sorted, FieldValue, OutputRecord, SourceEntity};
use dm_graph::{DirectoryClient, EntityQuery};
use serde_json::Value;

const COLLECTION: &str = "deviceAppManagement/mobileApps";

const TYPE_PREFIX: &str = "#microsoft.graph.";

const FIELDS: &[&str] = &[
    "Title",
    "AppId",
    "Publisher",
    "AppType",
    "Assignments",
    "LastModified",
];

pub struct IntuneApps;

/// Who an assignment targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    AllUsers,
    AllDevices,
    Group { id: String, excluded: bool },
    Other(String),
}

impl Target {
    pub(crate) fn parse(target: &Value) -> Self {
        let kind = target
            .get("@odata.type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let group_id = target.get("groupId").and_then(Value::as_str);
        match (strip_type_prefix(kind), group_id) {
            ("allLicensedUsersAssignmentTarget", _) => Target::AllUsers,
            ("allDevicesAssignmentTarget", _) => Target::AllDevices,
            ("exclusionGroupAssignmentTarget", Some(id)) => Target::Group {
                id: id.to_string(),
                excluded: true,
            },
            ("groupAssignmentTarget", Some(id)) => Target::Group {
                id: id.to_string(),
                excluded: false,
            },
            (other, _) => Target::Other(other.to_string()),
        }
    }
}

#[async_trait]
impl Pipeline for IntuneApps {
    fn name(&self) -> &'static str {
        "intune-apps"
    }

    fn query(&self) -> EntityQuery {
        EntityQuery::new(COLLECTION).select([
            "id",
            "displayName",
            "publisher",
            "lastModifiedDateTime",
        ])
    }

    fn default_filter(&self) -> Option<&'static str> {
        None
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
        let mut record = base_record(entity, "id", "AppId")?
            .with_field("Publisher", entity.str_attr("publisher").map(str::to_string))
            .with_field(
                "AppType",
                entity
                    .str_attr("@odata.type")
                    .map(|t| strip_type_prefix(t).to_string()),
            );

        let assignments = Lookup::classify(
            client
                .list_related(COLLECTION, entity.id.as_str(), "assignments", &[])
                .await,
            entity,
            "assignments",
        );
        let rendered = match assignments {
            Lookup::Found(items) => {
                render_assignments(client, entity, &items, &ctx.delimiter).await
            }
            Lookup::Absent => FieldValue::from("None"),
            Lookup::Failed(message) => FieldValue::error(message),
        };
        record.set("Assignments", rendered);
        record.set("LastModified", entity.timestamp_attr("lastModifiedDateTime"));

        Ok(record)
    }
}

/// `<target> (<intent>)` per assignment, joined; a failed group lookup marks
/// the whole field
async fn render_assignments(
    client: &dyn DirectoryClient,
    entity: &SourceEntity,
    assignments: &[Value],
    delimiter: &str,
) -> FieldValue {
    let mut labels = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let intent = assignment
            .get("intent")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let target = assignment
            .get("target")
            .map(Target::parse)
            .unwrap_or_else(|| Target::Other("unknown".to_string()));

        let label = match target {
            Target::AllUsers => "All users".to_string(),
            Target::AllDevices => "All devices".to_string(),
            Target::Other(kind) => kind,
            Target::Group { id, excluded } => {
                let name = match Lookup::classify(
                    client.get_entity("groups", &id, &["displayName"]).await,
                    entity,
                    "assigned group",
                ) {
                    Lookup::Found(group) => lookup_value(&group, "displayName")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| id.clone()),
                    // Deleted groups keep their assignment; show the id
                    Lookup::Absent => id.clone(),
                    Lookup::Failed(message) => return FieldValue::error(message),
                };
                if excluded {
                    format!("Exclude: {}", name)
                } else {
                    name
                }
            }
        };
        labels.push(format!("{} ({})", label, intent));
    }

    let joined = join_sorted(&labels, delimiter);
    if joined.is_empty() {
        FieldValue::from("None")
    } else {
        FieldValue::Text(joined)
    }
}

fn strip_type_prefix(odata_type: &str) -> &str {
    odata_type.strip_prefix(TYPE_PREFIX).unwrap_or(odata_type)
}

#[cfg(test)]
#[path = "intune_apps_test.rs"]
mod tests;
