use super::{
    error::{DuplicateResourceError, FetchError, MalformedEntryError},
    fetcher::EndpointResult,
    registry::{ApiResource, ApiResourceRegistry},
};
use crate::k8s_client::api::ApiResourceEntry;
use tracing::warn;

#[derive(Debug, Default)]
pub struct Aggregation {
    pub registry: ApiResourceRegistry,
    pub fetch_errors: Vec<FetchError>,
    pub malformed_entries: Vec<MalformedEntryError>,
}

/// Folds fetched resource lists into one registry.
///
/// Failed endpoints and invalid entries are collected and skipped. A resource
/// listed twice under the same group-version aborts the whole aggregation.
pub fn aggregate(results: Vec<EndpointResult>) -> Result<Aggregation, DuplicateResourceError> {
    let mut aggregation = Aggregation::default();
    for EndpointResult { descriptor, outcome } in results {
        let list = match outcome {
            Ok(list) => list,
            Err(err) => {
                aggregation.fetch_errors.push(err);
                continue;
            }
        };
        let group_version = descriptor.group_version.as_str();
        aggregation.registry.ensure_group_version(group_version);
        for (index, value) in list.resources.into_iter().enumerate() {
            let entry = match ApiResourceEntry::from_value(value) {
                Ok(entry) => entry,
                Err(cause) => {
                    let malformed = MalformedEntryError {
                        group_version: group_version.to_string(),
                        index,
                        cause,
                    };
                    warn!(group_version, index, cause = %malformed.cause, "dropping malformed resource entry");
                    aggregation.malformed_entries.push(malformed);
                    continue;
                }
            };
            aggregation.registry.insert(group_version, ApiResource::from(entry))?;
        }
    }
    Ok(aggregation)
}
