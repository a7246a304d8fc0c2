use super::endpoint::EndpointDescriptor;
use crate::k8s_client::{
    api::{EntryError, K8sApiError},
    K8sClientError,
};
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchErrorCause {
    #[error("transport error: {}", _0)]
    Transport(K8sClientError),
    #[error("timed out after {:?}", _0)]
    Timeout(Duration),
    #[error("unexpected status [{}]", _0)]
    Status(StatusCode),
    #[error("malformed resource list: {}", _0)]
    Decode(serde_json::Error),
    #[error("fetch task failed: {}", _0)]
    Task(String),
}

impl From<K8sApiError> for FetchErrorCause {
    fn from(err: K8sApiError) -> Self {
        match err {
            K8sApiError::UnexpectedStatus(status) => FetchErrorCause::Status(status),
            K8sApiError::Deserialize(err) => FetchErrorCause::Decode(err),
        }
    }
}

/// One endpoint could not be fetched. The rest of the run is unaffected.
#[derive(Debug, thiserror::Error)]
#[error("could not fetch \"{}\" from {}: {}", endpoint.group_version, endpoint.url, cause)]
pub struct FetchError {
    pub endpoint: EndpointDescriptor,
    pub cause: FetchErrorCause,
}

impl FetchError {
    pub fn new(endpoint: EndpointDescriptor, cause: FetchErrorCause) -> Self {
        Self { endpoint, cause }
    }
}

/// A single entry of a resource list failed validation and was dropped.
#[derive(Debug, thiserror::Error)]
#[error("dropped resource #{} of \"{}\": {}", index, group_version, cause)]
pub struct MalformedEntryError {
    pub group_version: String,
    pub index: usize,
    pub cause: EntryError,
}

/// The server listed the same resource twice within one group-version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resource \"{}\" is listed more than once in \"{}\"", name, group_version)]
pub struct DuplicateResourceError {
    pub group_version: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Could not list API groups: {}", _0)]
    GroupList(#[from] K8sClientError),
    #[error("Inconsistent server response: {}", _0)]
    Duplicate(#[from] DuplicateResourceError),
    #[error("Discovery was cancelled")]
    Cancelled,
}
