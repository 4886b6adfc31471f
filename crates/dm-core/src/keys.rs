//! Strongly-typed identifiers.

use crate::newtype_string::define_key_string;

define_key_string! {
    /// Stable identifier the directory assigns to an entity (`id`).
    pub struct EntityId;
}

define_key_string! {
    /// Caller-meaningful key that matches fresh records to sink rows
    /// (for example an application id).
    pub struct NaturalKey;
}

define_key_string! {
    /// Identifier the list store assigns to a row.
    pub struct RowId;
}
