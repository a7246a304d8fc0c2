use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a resource list, as served. Only `name`, `kind` and
/// `namespaced` are required; everything else may be absent or `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResourceEntry {
    pub name: String,
    #[serde(rename = "singularName", default)]
    pub singular_name: Option<String>,
    pub namespaced: bool,
    pub kind: String,
    #[serde(default)]
    pub verbs: Option<Vec<String>>,
    #[serde(rename = "shortNames", default)]
    pub short_names: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("{}", _0)]
    Decode(#[from] serde_json::Error),
    #[error("empty \"name\"")]
    EmptyName,
    #[error("empty \"kind\"")]
    EmptyKind,
}

impl ApiResourceEntry {
    /// Decodes and validates a single entry of `resources`.
    pub fn from_value(value: Value) -> Result<Self, EntryError> {
        let entry: ApiResourceEntry = serde_json::from_value(value)?;
        if entry.name.is_empty() {
            return Err(EntryError::EmptyName);
        }
        if entry.kind.is_empty() {
            return Err(EntryError::EmptyKind);
        }
        Ok(entry)
    }
}

/// Response of `GET /api/v1` or `GET /apis/<group>/<version>`.
///
/// Entries are kept undecoded so that one bad entry does not reject the
/// whole list.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ApiResourceList {
    #[serde(rename = "groupVersion", default)]
    pub group_version: Option<String>,
    pub resources: Vec<Value>,
}
