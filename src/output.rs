use crate::discovery::{ApiResource, ApiResourceRegistry, Discovery};
use itertools::Itertools;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    resources: &'a ApiResourceRegistry,
    fetch_errors: Vec<String>,
    malformed_entries: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Match<'a> {
    group_version: &'a str,
    #[serde(flatten)]
    resource: &'a ApiResource,
}

/// The whole registry plus the warnings of the run.
pub fn report_json(discovery: &Discovery) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&Report {
        resources: discovery.registry(),
        fetch_errors: discovery.fetch_errors().iter().map(ToString::to_string).collect(),
        malformed_entries: discovery.malformed_entries().iter().map(ToString::to_string).collect(),
    })
}

pub fn matches_json<'a>(rows: &[(&'a str, &'a ApiResource)]) -> Result<String, serde_json::Error> {
    let matches = rows
        .iter()
        .map(|&(group_version, resource)| Match { group_version, resource })
        .collect::<Vec<_>>();
    serde_json::to_string_pretty(&matches)
}

/// Renders rows the way `kubectl api-resources -o wide` does. Subresources
/// are left out.
pub fn table<'a, I>(rows: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a ApiResource)>,
{
    let header = ["NAME", "SHORTNAMES", "APIVERSION", "NAMESPACED", "KIND", "VERBS"].map(String::from);
    let rows = rows
        .into_iter()
        .filter(|(_, resource)| !resource.is_subresource())
        .map(|(group_version, resource)| {
            [
                resource.name.clone(),
                resource.short_names.iter().join(","),
                group_version.to_string(),
                resource.namespaced.to_string(),
                resource.kind.clone(),
                format!("[{}]", resource.verbs.iter().join(" ")),
            ]
        });
    let lines = std::iter::once(header).chain(rows).collect::<Vec<_>>();

    let mut widths = [0usize; 6];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.len());
        }
    }
    lines
        .iter()
        .map(|line| {
            line.iter()
                .zip(widths.iter())
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .join("   ")
                .trim_end()
                .to_string()
        })
        .join("\n")
}
