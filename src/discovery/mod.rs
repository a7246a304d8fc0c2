//! Discovery of every API resource a cluster serves.
//!
//! A run lists the advertised API groups, enumerates one endpoint per
//! group-version plus the legacy `/api/v1`, fetches all of them concurrently
//! and folds the results into an [`ApiResourceRegistry`].

mod aggregator;
mod endpoint;
mod error;
mod fetcher;
mod registry;

pub use aggregator::{aggregate, Aggregation};
pub use endpoint::{enumerate, EndpointDescriptor, LEGACY_GROUP_VERSION};
pub use error::{DiscoveryError, DuplicateResourceError, FetchError, FetchErrorCause, MalformedEntryError};
pub use fetcher::{EndpointResult, Fetcher};
pub use registry::{ApiResource, ApiResourceRegistry};

use crate::k8s_client::{
    api::{ApiGroupList, ApiGroupListGetter},
    ApiGet, K8sClient,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Upper bound of resource-list requests in flight at once.
    pub max_in_flight: usize,
    /// Per endpoint.
    pub request_timeout: Duration,
    /// Whole run, group listing included. Exceeding it cancels the run.
    pub timeout: Option<Duration>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 16,
            request_timeout: Duration::from_secs(10),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    /// Every endpoint answered and every entry was valid.
    Complete,
    /// The registry is usable but some endpoints or entries are missing.
    Partial,
}

/// Outcome of a run that was not aborted.
#[derive(Debug)]
pub struct Discovery {
    registry: ApiResourceRegistry,
    fetch_errors: Vec<FetchError>,
    malformed_entries: Vec<MalformedEntryError>,
}

impl Discovery {
    pub fn registry(&self) -> &ApiResourceRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ApiResourceRegistry {
        self.registry
    }

    pub fn fetch_errors(&self) -> &[FetchError] {
        &self.fetch_errors
    }

    pub fn malformed_entries(&self) -> &[MalformedEntryError] {
        &self.malformed_entries
    }

    pub fn status(&self) -> DiscoveryStatus {
        if self.fetch_errors.is_empty() && self.malformed_entries.is_empty() {
            DiscoveryStatus::Complete
        } else {
            DiscoveryStatus::Partial
        }
    }
}

impl From<Aggregation> for Discovery {
    fn from(aggregation: Aggregation) -> Self {
        Self {
            registry: aggregation.registry,
            fetch_errors: aggregation.fetch_errors,
            malformed_entries: aggregation.malformed_entries,
        }
    }
}

pub struct Discoverer<C: ?Sized> {
    client: Arc<C>,
    options: DiscoveryOptions,
}

impl<C: ApiGet + ?Sized + 'static> Discoverer<C> {
    pub fn new(client: Arc<C>, options: DiscoveryOptions) -> Self {
        Self { client, options }
    }

    /// Discovers the resources of `groups` plus the legacy core API on `server`.
    pub async fn run(
        &self,
        server: &str,
        groups: &ApiGroupList,
        cancel: &CancellationToken,
    ) -> Result<Discovery, DiscoveryError> {
        let deadline = self.options.timeout.map(|timeout| Instant::now() + timeout);
        self.run_until(server, groups, cancel, deadline).await
    }

    async fn run_until(
        &self,
        server: &str,
        groups: &ApiGroupList,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Discovery, DiscoveryError> {
        let descriptors = enumerate(server, groups);
        info!(
            endpoints = descriptors.len(),
            max_in_flight = self.options.max_in_flight,
            "discovering api resources"
        );
        let fetcher = Fetcher::new(
            Arc::clone(&self.client),
            self.options.max_in_flight,
            self.options.request_timeout,
        );
        let results = guarded(cancel, deadline, fetcher.fetch_all(descriptors)).await?;

        let discovery = Discovery::from(aggregate(results)?);
        info!(
            group_versions = discovery.registry.group_versions().count(),
            resources = discovery.registry.len(),
            fetch_errors = discovery.fetch_errors.len(),
            malformed_entries = discovery.malformed_entries.len(),
            "discovery finished"
        );
        Ok(discovery)
    }
}

impl Discoverer<K8sClient> {
    /// Lists the API groups through the client, then runs discovery.
    pub async fn discover(&self, cancel: &CancellationToken) -> Result<Discovery, DiscoveryError> {
        let deadline = self.options.timeout.map(|timeout| Instant::now() + timeout);
        let groups = guarded(cancel, deadline, self.client.get(&ApiGroupListGetter)).await??;
        self.run_until(self.client.server(), &groups, cancel, deadline).await
    }
}

/// Races `work` against cancellation and the deadline. Losing the race drops
/// `work`, which abandons whatever it had in flight.
async fn guarded<F: Future>(
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    work: F,
) -> Result<F::Output, DiscoveryError> {
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("discovery cancelled");
            Err(DiscoveryError::Cancelled)
        }
        _ = expired => {
            warn!("discovery timed out");
            Err(DiscoveryError::Cancelled)
        }
        output = work => Ok(output),
    }
}
