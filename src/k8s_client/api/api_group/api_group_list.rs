use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroupVersion {
    #[serde(rename = "groupVersion")]
    pub group_version: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroupListItem {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<ApiGroupVersion>,
    #[serde(rename = "preferredVersion")]
    pub preferred_version: Option<ApiGroupVersion>,
}

/// Response of `GET /apis`: every API group the server advertises.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGroupList {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub groups: Vec<ApiGroupListItem>,
}

impl ApiGroupList {
    /// Group-versions in advertised order, including repeats.
    pub fn group_versions(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|group| group.versions.iter())
            .map(|version| version.group_version.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_server_response() {
        let body = r#"{
            "kind": "APIGroupList",
            "apiVersion": "v1",
            "groups": [
                {
                    "name": "apps",
                    "versions": [{"groupVersion": "apps/v1", "version": "v1"}],
                    "preferredVersion": {"groupVersion": "apps/v1", "version": "v1"}
                },
                {
                    "name": "autoscaling",
                    "versions": [
                        {"groupVersion": "autoscaling/v2", "version": "v2"},
                        {"groupVersion": "autoscaling/v1", "version": "v1"}
                    ]
                }
            ]
        }"#;
        let list: ApiGroupList = serde_json::from_str(body).unwrap();
        assert_eq!(list.kind, "APIGroupList");
        assert_eq!(list.groups[1].preferred_version, None);
        assert_eq!(
            list.group_versions().collect::<Vec<_>>(),
            vec!["apps/v1", "autoscaling/v2", "autoscaling/v1"]
        );
    }
}
