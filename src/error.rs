use crate::{
    discovery::DiscoveryError,
    k8s_client::{api::cluster_config::ClusterConfigError, K8sClientError},
};
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Kubernetes client error: {:?}", _0)]
    K8sClient(#[from] K8sClientError),
    #[error("Could not obtain cluster config: {:?}", _0)]
    ClusterConfig(#[from] ClusterConfigError),
    #[error("Discovery failed: {}", _0)]
    Discovery(#[from] DiscoveryError),
    #[error("Serialization error: {:?}", _0)]
    Serialize(#[from] serde_json::Error),
    #[error("Could not write output: {:?}", _0)]
    Output(#[from] io::Error),
}
