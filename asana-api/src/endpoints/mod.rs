pub mod tasks;
pub mod workspaces;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fields requested for task listings.
pub const TASK_FIELDS: &str = "gid,name,completed,due_on,due_at,permalink_url,\
assignee.gid,assignee.name,assignee.email,assignee.photo.image_60x60,memberships.project.name";

/// Fields requested for a single task, on top of [`TASK_FIELDS`].
pub const TASK_DETAIL_FIELDS: &str = "gid,name,completed,due_on,due_at,permalink_url,\
notes,created_at,modified_at,assignee.gid,assignee.name,assignee.email,\
assignee.photo.image_60x60,memberships.project.name,tags.gid,tags.name";

pub const WORKSPACE_FIELDS: &str = "gid,name";

/// Every Asana response wraps its payload in `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Query string carrying only `opt_fields`.
#[derive(Debug, Clone, Serialize)]
pub struct FieldsQuery {
    pub opt_fields: &'static str,
}

/// A single field of a partial update.
///
/// `Unset` leaves the remote value untouched and is omitted from the payload,
/// `Clear` is sent as `null`, `Value` is sent as-is. Deserializing maps a
/// missing key (with `#[serde(default)]`) to `Unset` and an explicit `null`
/// to `Clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    #[default]
    Unset,
    Clear,
    Value(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldUpdate::Unset)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            FieldUpdate::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<T> for FieldUpdate<T> {
    fn from(value: T) -> Self {
        FieldUpdate::Value(value)
    }
}

impl<T: Serialize> Serialize for FieldUpdate<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldUpdate::Value(value) => value.serialize(serializer),
            FieldUpdate::Unset | FieldUpdate::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldUpdate<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => FieldUpdate::Value(value),
            None => FieldUpdate::Clear,
        })
    }
}

/// Serializes a list of gids the way Asana's `*.any` filters expect them.
pub(crate) fn comma_separated<S>(values: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&values.join(","))
}
