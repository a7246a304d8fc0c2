mod api_group;
mod api_resource;
pub mod cluster_config;

pub use api_group::{ApiGroupList, ApiGroupListItem, ApiGroupVersion};
pub use api_resource::{ApiResourceEntry, ApiResourceList, EntryError};
use reqwest::{Method, StatusCode};
use std::fmt;

pub trait ApiGetter: Clone {
    type Output;
    fn get(&self) -> Req<Self::Output>;
}

#[derive(Debug, thiserror::Error)]
pub enum K8sApiError {
    #[error("Unexpected status [{}]", _0)]
    UnexpectedStatus(StatusCode),
    #[error("Deserialization error: {:?}", _0)]
    Deserialize(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct Req<T> {
    pub method: Method,
    pub relative_url: String,
    pub body: Vec<u8>,
    pub status_check: fn(StatusCode) -> bool,
    pub response: fn(&[u8]) -> Result<T, K8sApiError>,
}

impl<T> fmt::Debug for Req<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Req")
            .field("method", &self.method)
            .field("relative_url", &self.relative_url)
            .field("response", &"fn(...)")
            .finish()
    }
}

impl<T> Req<T> {
    fn get<S: Into<String>>(relative_url: S, f: fn(&[u8]) -> Result<T, K8sApiError>) -> Self {
        Self {
            method: Method::GET,
            relative_url: relative_url.into(),
            body: Vec::new(),
            status_check: |status_code| status_code.is_success(),
            response: f,
        }
    }
}

/// Decodes a resource list body, checking the status first.
pub fn resource_list_from_response(status: StatusCode, body: &[u8]) -> Result<ApiResourceList, K8sApiError> {
    if !status.is_success() {
        return Err(K8sApiError::UnexpectedStatus(status));
    }
    Ok(serde_json::from_slice(body)?)
}

#[derive(Debug, Clone)]
pub struct ApiGroupListGetter;
impl ApiGetter for ApiGroupListGetter {
    type Output = ApiGroupList;
    fn get(&self) -> Req<Self::Output> {
        Req::get("/apis", |resp| Ok(serde_json::from_slice(resp)?))
    }
}

/// Resources of the legacy core API, `/api/<version>`.
#[derive(Debug, Clone)]
pub struct CoreResourceListGetter<'a> {
    pub version: &'a str,
}
impl<'a> ApiGetter for CoreResourceListGetter<'a> {
    type Output = ApiResourceList;
    fn get(&self) -> Req<Self::Output> {
        Req::get(format!("/api/{}", self.version), |resp| Ok(serde_json::from_slice(resp)?))
    }
}

/// Resources of an advertised group-version, `/apis/<groupVersion>`.
#[derive(Debug, Clone)]
pub struct ApiResourceListGetter<'a> {
    pub group_version: &'a str,
}
impl<'a> ApiGetter for ApiResourceListGetter<'a> {
    type Output = ApiResourceList;
    fn get(&self) -> Req<Self::Output> {
        Req::get(format!("/apis/{}", self.group_version), |resp| Ok(serde_json::from_slice(resp)?))
    }
}
