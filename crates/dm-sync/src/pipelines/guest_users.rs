//! Guest users with contact address, activity and group memberships

use super::{base_record, Pipeline};
use crate::enricher::{EnrichContext, Lookup};
use crate::error::SyncResult;
use async_trait::async_trait;
use dm_core::email::{email_domain, extract_email, guest_upn_to_email};
use dm_core::entity::lookup_value;
use dm_core::time::parse_utc;
use dm_core::{join_sorted, FieldValue, OutputRecord, SourceEntity};
use dm_graph::{DirectoryClient, EntityQuery};
use serde_json::Value;

const COLLECTION: &str = "users";

const GROUP_TYPE: &str = "#microsoft.graph.group";

const FIELDS: &[&str] = &[
    "Title",
    "UserId",
    "Email",
    "Domain",
    "Created",
    "LastSignIn",
    "AccountEnabled",
    "InvitationState",
    "Groups",
];

pub struct GuestUsers;

#[async_trait]
impl Pipeline for GuestUsers {
    fn name(&self) -> &'static str {
        "guests"
    }

    fn query(&self) -> EntityQuery {
        EntityQuery::new(COLLECTION)
            .select([
                "id",
                "displayName",
                "mail",
                "otherMails",
                "userPrincipalName",
                "createdDateTime",
                "accountEnabled",
                "externalUserState",
                "userType",
            ])
            .filter("userType eq 'Guest'")
    }

    fn default_filter(&self) -> Option<&'static str> {
        None
    }

    fn key_field(&self) -> &'static str {
        "UserId"
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
        let email = guest_email(entity);
        let domain = email.as_deref().and_then(email_domain).map(str::to_string);

        let mut record = base_record(entity, "id", "UserId")?
            .with_field("Email", email)
            .with_field("Domain", domain)
            .with_field("Created", entity.timestamp_attr("createdDateTime"));

        // Sign-in activity needs a premium licence; without one the service
        // answers 403 and the value is reported as unavailable.
        let activity = client
            .get_entity(COLLECTION, id, &["id", "signInActivity"])
            .await;
        let last_sign_in = match activity {
            Err(e) if e.is_forbidden() => FieldValue::from("Unavailable"),
            result => Lookup::classify(result, entity, "sign-in activity").render("Never", |user| {
                match last_sign_in_at(&user) {
                    Some(ts) => FieldValue::Timestamp(ts),
                    None => FieldValue::from("Never"),
                }
            }),
        };
        record.set("LastSignIn", last_sign_in);

        record.set("AccountEnabled", entity.bool_attr("accountEnabled"));
        record.set(
            "InvitationState",
            entity.str_attr("externalUserState").map(str::to_string),
        );

        let memberships = Lookup::classify(
            client
                .list_related(COLLECTION, id, "memberOf", &["id", "displayName"])
                .await,
            entity,
            "memberships",
        );
        record.set(
            "Groups",
            memberships.render("None", |items| {
                let joined = join_sorted(group_names(&items), &ctx.delimiter);
                if joined.is_empty() {
                    FieldValue::from("None")
                } else {
                    FieldValue::Text(joined)
                }
            }),
        );

        Ok(record)
    }
}

/// Contact address: `mail`, else the first of `otherMails`, else the
/// address encoded in the guest principal name
pub(crate) fn guest_email(entity: &SourceEntity) -> Option<String> {
    let from_mail = entity.str_attr("mail").and_then(extract_email);
    let from_other = || {
        entity
            .attribute("otherMails")
            .and_then(Value::as_array)
            .and_then(|mails| mails.iter().filter_map(Value::as_str).find_map(extract_email))
    };
    let from_upn = || {
        entity
            .str_attr("userPrincipalName")
            .and_then(guest_upn_to_email)
    };
    from_mail.or_else(from_other).or_else(from_upn)
}

fn last_sign_in_at(user: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    lookup_value(user, "signInActivity/lastSignInDateTime")
        .and_then(Value::as_str)
        .and_then(parse_utc)
}

/// Group display names among directory objects a user is a member of
fn group_names(objects: &[Value]) -> Vec<&str> {
    objects
        .iter()
        .filter(|o| {
            o.get("@odata.type")
                .and_then(Value::as_str)
                .map_or(true, |t| t.eq_ignore_ascii_case(GROUP_TYPE))
        })
        .filter_map(|o| o.get("displayName").and_then(Value::as_str))
        .collect()
}

#[cfg(test)]
#[path = "guest_users_test.rs"]
mod tests;
