use super::error::DuplicateResourceError;
use crate::k8s_client::api::ApiResourceEntry;
use indexmap::{map::Entry, IndexMap};
use serde::Serialize;
use std::collections::BTreeSet;

/// Metadata of one resource type served under a group-version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub name: String,
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: String,
    pub verbs: BTreeSet<String>,
    pub short_names: BTreeSet<String>,
}

impl ApiResource {
    pub fn supports(&self, verb: &str) -> bool {
        self.verbs.contains(verb)
    }

    /// `pods/log`, `deployments/scale` and friends.
    pub fn is_subresource(&self) -> bool {
        self.name.contains('/')
    }
}

impl From<ApiResourceEntry> for ApiResource {
    fn from(entry: ApiResourceEntry) -> Self {
        let singular_name = match entry.singular_name {
            Some(singular) if !singular.is_empty() => singular,
            _ => entry.kind.to_lowercase(),
        };
        Self {
            name: entry.name,
            singular_name,
            namespaced: entry.namespaced,
            kind: entry.kind,
            verbs: entry.verbs.unwrap_or_default().into_iter().collect(),
            short_names: entry.short_names.unwrap_or_default().into_iter().collect(),
        }
    }
}

/// groupVersion -> resource name -> [`ApiResource`].
///
/// Iteration follows discovery order; equality ignores order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApiResourceRegistry {
    group_versions: IndexMap<String, IndexMap<String, ApiResource>>,
}

impl ApiResourceRegistry {
    pub(super) fn ensure_group_version(&mut self, group_version: &str) {
        if !self.group_versions.contains_key(group_version) {
            self.group_versions.insert(group_version.to_string(), IndexMap::new());
        }
    }

    pub(super) fn insert(&mut self, group_version: &str, resource: ApiResource) -> Result<(), DuplicateResourceError> {
        let resources = self.group_versions.entry(group_version.to_string()).or_default();
        match resources.entry(resource.name.clone()) {
            Entry::Occupied(occupied) => Err(DuplicateResourceError {
                group_version: group_version.to_string(),
                name: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(resource);
                Ok(())
            }
        }
    }

    pub fn resource(&self, group_version: &str, name: &str) -> Option<&ApiResource> {
        self.group_versions.get(group_version)?.get(name)
    }

    pub fn group_versions(&self) -> impl Iterator<Item = &str> {
        self.group_versions.keys().map(String::as_str)
    }

    /// `None` when the group-version was never discovered. A group-version
    /// that was fetched but serves nothing yields an empty iterator.
    pub fn resources(&self, group_version: &str) -> Option<impl Iterator<Item = &ApiResource>> {
        self.group_versions.get(group_version).map(|resources| resources.values())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ApiResource)> {
        self.group_versions.iter().flat_map(|(group_version, resources)| {
            resources
                .values()
                .map(move |resource| (group_version.as_str(), resource))
        })
    }

    /// Number of resources across all group-versions.
    pub fn len(&self) -> usize {
        self.group_versions.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves what a user would type after `kubectl get`: plural name,
    /// singular name, short name, `name.group` or `name.version.group`.
    pub fn find(&self, target: &str) -> Vec<(&str, &ApiResource)> {
        let target = target.to_lowercase();
        self.iter()
            .filter(|(group_version, resource)| {
                if resource.name == target || resource.singular_name == target || resource.short_names.contains(&target)
                {
                    return true;
                }
                match group_version.split_once('/') {
                    Some((group, version)) => {
                        target == format!("{}.{}", resource.name, group)
                            || target == format!("{}.{}.{}", resource.name, version, group)
                    }
                    None => false,
                }
            })
            .collect()
    }
}
