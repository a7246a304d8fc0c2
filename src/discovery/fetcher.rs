use super::{
    endpoint::EndpointDescriptor,
    error::{FetchError, FetchErrorCause},
};
use crate::k8s_client::{
    api::{resource_list_from_response, ApiResourceList},
    ApiGet,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct EndpointResult {
    pub descriptor: EndpointDescriptor,
    pub outcome: Result<ApiResourceList, FetchError>,
}

/// Fetches resource lists concurrently, at most `max_in_flight` at a time.
pub struct Fetcher<C: ?Sized> {
    client: Arc<C>,
    max_in_flight: usize,
    request_timeout: Duration,
}

impl<C: ApiGet + ?Sized + 'static> Fetcher<C> {
    pub fn new(client: Arc<C>, max_in_flight: usize, request_timeout: Duration) -> Self {
        Self {
            client,
            max_in_flight: max_in_flight.max(1),
            request_timeout,
        }
    }

    /// Settles every descriptor, successful or not. Results come back in
    /// descriptor order. Dropping the returned future aborts the fetches
    /// still in flight.
    pub async fn fetch_all(&self, descriptors: Vec<EndpointDescriptor>) -> Vec<EndpointResult> {
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks = JoinSet::new();
        for (index, descriptor) in descriptors.iter().cloned().enumerate() {
            let client = Arc::clone(&self.client);
            let permits = Arc::clone(&permits);
            let timeout = self.request_timeout;
            tasks.spawn(async move {
                let _permit = permits.acquire().await.ok();
                (index, fetch_one(client.as_ref(), &descriptor, timeout).await)
            });
        }

        let mut settled = descriptors.iter().map(|_| None).collect::<Vec<_>>();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => settled[index] = Some(outcome),
                Err(err) => warn!(error = %err, "resource list fetch task did not complete"),
            }
        }

        descriptors
            .into_iter()
            .zip(settled)
            .map(|(descriptor, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    Err(FetchError::new(
                        descriptor.clone(),
                        FetchErrorCause::Task("task panicked or was aborted".into()),
                    ))
                });
                if let Err(err) = &outcome {
                    warn!(group_version = %descriptor.group_version, error = %err.cause, "endpoint skipped");
                }
                EndpointResult { descriptor, outcome }
            })
            .collect()
    }
}

async fn fetch_one<C: ApiGet + ?Sized>(
    client: &C,
    descriptor: &EndpointDescriptor,
    timeout: Duration,
) -> Result<ApiResourceList, FetchError> {
    let fail = |cause| FetchError::new(descriptor.clone(), cause);
    let started = Instant::now();
    let response = match tokio::time::timeout(timeout, client.get_raw(&descriptor.url)).await {
        Err(_) => return Err(fail(FetchErrorCause::Timeout(timeout))),
        Ok(Err(err)) if err.is_timeout() => return Err(fail(FetchErrorCause::Timeout(timeout))),
        Ok(Err(err)) => return Err(fail(FetchErrorCause::Transport(err))),
        Ok(Ok(response)) => response,
    };
    let list = resource_list_from_response(response.status, &response.body).map_err(|err| fail(err.into()))?;

    if let Some(served) = list.group_version.as_deref() {
        if served != descriptor.group_version {
            warn!(
                group_version = %descriptor.group_version,
                served = %served,
                "resource list reports a different groupVersion than requested"
            );
        }
    }
    debug!(
        group_version = %descriptor.group_version,
        resources = list.resources.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetched resource list"
    );
    Ok(list)
}
