//! The backend sometimes populates references (`{ "_id": .. }`) and
//! sometimes sends bare ids. These helpers accept both.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum IdOrObject {
    Id(String),
    Object {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl IdOrObject {
    fn into_id(self) -> String {
        match self {
            IdOrObject::Id(id) | IdOrObject::Object { id } => id,
        }
    }
}

pub(crate) fn id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<IdOrObject>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().map(IdOrObject::into_id).collect())
}

/// Duplicate ids collapse: a user likes something at most once.
pub(crate) fn id_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_list(deserializer)?.into_iter().collect())
}

/// `None` when the field is absent or null, so callers can tell "no data"
/// apart from "nobody".
pub(crate) fn optional_id_set<'de, D>(deserializer: D) -> Result<Option<BTreeSet<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<IdOrObject>>::deserialize(deserializer)?;
    Ok(items.map(|items| items.into_iter().map(IdOrObject::into_id).collect()))
}

pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdOrObject>::deserialize(deserializer)?.map(IdOrObject::into_id))
}

pub(crate) fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_id(deserializer)?.unwrap_or_default())
}
