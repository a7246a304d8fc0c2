pub mod api;

use crate::k8s_client::api::{
    cluster_config::{AuthMethod, ClusterConfig},
    ApiGetter, K8sApiError,
};
use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{header, Method, Request, Response, StatusCode, Url};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Applied to every request the client sends.
    pub request_timeout: Duration,
    /// Upper bound for retrying transient failures of `get`. `None` retries forever.
    pub retry_max_elapsed: Option<Duration>,
    pub https_only: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            retry_max_elapsed: Some(Duration::from_secs(30)),
            https_only: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct K8sClient {
    base_url: Url,
    client: reqwest::Client,
    retry_max_elapsed: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum K8sClientError {
    #[error("Request error {:?}", _0)]
    Reqwest(#[from] reqwest::Error),
    #[error("Url parse error {:?}", _0)]
    UrlParse(#[from] url::ParseError),
    #[error("Kubernetes API error {:?}", _0)]
    K8sApi(#[from] K8sApiError),
}

impl K8sClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, K8sClientError::Reqwest(err) if err.is_timeout())
    }
}

/// Status and body of a single GET.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// The one primitive discovery needs from a cluster connection: an
/// authenticated GET against an absolute URL.
#[async_trait]
pub trait ApiGet: Send + Sync {
    async fn get_raw(&self, url: &str) -> Result<RawResponse, K8sClientError>;
}

impl K8sClient {
    pub fn new(config: ClusterConfig, options: &ClientOptions) -> Result<Self, K8sClientError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls() // identity from PEM only works in rustls
            .timeout(options.request_timeout)
            .https_only(options.https_only);
        if let Some(cacert) = config.cacert {
            builder = builder.add_root_certificate(cacert).tls_built_in_root_certs(false);
        }
        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder = match config.auth {
            AuthMethod::Identity(identity) => builder.identity(identity),
            AuthMethod::Token(token) => {
                let mut headers = header::HeaderMap::new();
                headers.insert(header::AUTHORIZATION, token);
                builder.default_headers(headers)
            }
            AuthMethod::Anonymous => builder,
        };
        let client = builder.build().map_err(K8sClientError::Reqwest)?;
        let base_url = Url::parse(&config.server).map_err(K8sClientError::UrlParse)?;
        Ok(Self {
            base_url,
            client,
            retry_max_elapsed: options.retry_max_elapsed,
        })
    }

    /// Server URL without a trailing slash, ready for appending API paths.
    pub fn server(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            current_interval: Duration::from_millis(100),
            max_elapsed_time: self.retry_max_elapsed,
            randomization_factor: 0.1,
            max_interval: Duration::from_secs(10),
            multiplier: 1.3,
            clock: Default::default(),
            start_time: Instant::now(),
        }
    }

    fn notify(err: K8sClientError, duration: Duration) {
        warn!(error = %err, retry_in_ms = duration.as_millis() as u64, "request failed, retrying");
    }

    async fn send(&self, method: &Method, uri: &str, body: Vec<u8>) -> Result<Response, K8sClientError> {
        let url = &Url::parse(&format!("{}{}", self.server(), uri))?;
        let send = move || {
            let mut req = Request::new(method.clone(), url.clone());
            *req.body_mut() = Some(reqwest::Body::from(body.clone()));
            let execute = self.client.execute(req);
            async move {
                execute.await.map_err(|e| {
                    if e.is_connect() || e.is_decode() || e.is_timeout() {
                        backoff::Error::transient(K8sClientError::from(e))
                    } else {
                        backoff::Error::permanent(K8sClientError::from(e))
                    }
                })
            }
        };
        retry_notify(self.backoff(), send, Self::notify).await
    }

    pub async fn get<T: ApiGetter>(&self, getter: &T) -> Result<T::Output, K8sClientError> {
        let req = getter.get();
        debug!(url = %req.relative_url, "sending request");
        let resp = self.send(&req.method, &req.relative_url, req.body).await?;
        let status = resp.status();
        if !(req.status_check)(status) {
            return Err(K8sClientError::K8sApi(K8sApiError::UnexpectedStatus(status)));
        }
        let bytes = resp.bytes().await?;
        let result = (req.response)(&bytes)?;
        Ok(result)
    }
}

#[async_trait]
impl ApiGet for K8sClient {
    async fn get_raw(&self, url: &str) -> Result<RawResponse, K8sClientError> {
        let url = Url::parse(url)?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}
