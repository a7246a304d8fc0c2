use crate::k8s_client::api::{ApiGetter, ApiGroupList, ApiResourceListGetter, CoreResourceListGetter};
use itertools::Itertools;
use serde::Serialize;
use std::iter;

/// Group-version of the legacy core API, always served at `/api/v1`.
pub const LEGACY_GROUP_VERSION: &str = "v1";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub group_version: String,
    pub url: String,
}

impl EndpointDescriptor {
    /// An advertised group-version, always under `/apis`.
    pub fn new(server: &str, group_version: &str) -> Self {
        let path = ApiResourceListGetter { group_version }.get().relative_url;
        Self::at(server, group_version, &path)
    }

    pub fn legacy(server: &str) -> Self {
        let path = CoreResourceListGetter {
            version: LEGACY_GROUP_VERSION,
        }
        .get()
        .relative_url;
        Self::at(server, LEGACY_GROUP_VERSION, &path)
    }

    fn at(server: &str, group_version: &str, path: &str) -> Self {
        Self {
            group_version: group_version.to_string(),
            url: format!("{}{}", server.trim_end_matches('/'), path),
        }
    }
}

/// Legacy endpoint first, then every advertised group-version once, in
/// advertised order.
pub fn enumerate(server: &str, groups: &ApiGroupList) -> Vec<EndpointDescriptor> {
    let advertised = groups
        .group_versions()
        .filter(|group_version| !group_version.is_empty())
        .map(|group_version| EndpointDescriptor::new(server, group_version));
    iter::once(EndpointDescriptor::legacy(server))
        .chain(advertised)
        .unique_by(|descriptor| descriptor.group_version.clone())
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::k8s_client::api::{ApiGroupListItem, ApiGroupVersion};

    fn group(name: &str, versions: &[&str]) -> ApiGroupListItem {
        ApiGroupListItem {
            name: name.into(),
            versions: versions
                .iter()
                .map(|version| ApiGroupVersion {
                    group_version: format!("{}/{}", name, version),
                    version: version.to_string(),
                })
                .collect(),
            preferred_version: None,
        }
    }

    fn groups(groups: Vec<ApiGroupListItem>) -> ApiGroupList {
        ApiGroupList {
            groups,
            ..ApiGroupList::default()
        }
    }

    #[test]
    fn starts_with_legacy_endpoint() {
        let endpoints = enumerate("https://k8s:6443", &ApiGroupList::default());
        assert_eq!(
            endpoints,
            vec![EndpointDescriptor {
                group_version: "v1".into(),
                url: "https://k8s:6443/api/v1".into(),
            }]
        );
    }

    #[test]
    fn one_endpoint_per_group_version_in_order() {
        let list = groups(vec![
            group("apps", &["v1"]),
            group("autoscaling", &["v2", "v1"]),
            group("batch", &["v1"]),
        ]);
        let endpoints = enumerate("https://k8s:6443/", &list);
        let urls = endpoints.iter().map(|e| e.url.as_str()).collect::<Vec<_>>();
        assert_eq!(
            urls,
            vec![
                "https://k8s:6443/api/v1",
                "https://k8s:6443/apis/apps/v1",
                "https://k8s:6443/apis/autoscaling/v2",
                "https://k8s:6443/apis/autoscaling/v1",
                "https://k8s:6443/apis/batch/v1",
            ]
        );
        assert_eq!(endpoints[2].group_version, "autoscaling/v2");
    }

    #[test]
    fn deduplicates_group_versions() {
        let list = groups(vec![
            group("apps", &["v1", "v1"]),
            group("batch", &["v1"]),
            group("apps", &["v1"]),
        ]);
        let endpoints = enumerate("http://proxy", &list);
        let group_versions = endpoints.iter().map(|e| e.group_version.as_str()).collect::<Vec<_>>();
        assert_eq!(group_versions, vec!["v1", "apps/v1", "batch/v1"]);
    }

    #[test]
    fn skips_blank_group_versions() {
        let mut list = groups(vec![group("apps", &["v1"])]);
        list.groups[0].versions.push(ApiGroupVersion::default());
        assert_eq!(enumerate("http://proxy", &list).len(), 2);
    }

    #[test]
    fn slashless_advertised_group_version_is_fetched_from_apis() {
        let list = groups(vec![ApiGroupListItem {
            name: "metrics".into(),
            versions: vec![ApiGroupVersion {
                group_version: "v1beta1".into(),
                version: "v1beta1".into(),
            }],
            preferred_version: None,
        }]);
        let endpoints = enumerate("https://k8s:6443", &list);
        assert_eq!(endpoints[0].url, "https://k8s:6443/api/v1");
        assert_eq!(endpoints[1].url, "https://k8s:6443/apis/v1beta1");
    }

    #[test]
    fn keeps_server_path_prefix() {
        let endpoint = EndpointDescriptor::new("https://rancher/k8s/clusters/c-1", "apps/v1");
        assert_eq!(endpoint.url, "https://rancher/k8s/clusters/c-1/apis/apps/v1");
    }
}
