use crate::{discovery::DiscoveryOptions, k8s_client::ClientOptions};
use std::{path::PathBuf, str::FromStr, time::Duration};
use structopt::StructOpt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format \"{}\", expected \"table\" or \"json\"", other)),
        }
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "cartographer")]
pub struct Args {
    /// Kubeconfig to use instead of $KUBECONFIG, the in-cluster account or ~/.kube/config.
    /// Of several files in $KUBECONFIG only the first is read
    #[structopt(long, parse(from_os_str))]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context, defaults to current-context
    #[structopt(long)]
    pub context: Option<String>,
    /// Resource lists fetched at once
    #[structopt(long, default_value = "16")]
    pub concurrency: usize,
    #[structopt(long = "request-timeout-secs", default_value = "10")]
    pub request_timeout_secs: u64,
    /// Abort the whole discovery after this many seconds
    #[structopt(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,
    /// How long to retry listing API groups
    #[structopt(long = "retry-secs", default_value = "30")]
    pub retry_secs: u64,
    /// Allow plain http servers, e.g. `kubectl proxy`
    #[structopt(long = "allow-http")]
    pub allow_http: bool,
    /// table or json
    #[structopt(long, default_value = "table")]
    pub output: OutputFormat,
    /// Only show resources matching this name, singular, short name or name.group
    pub resource: Option<String>,
}

impl Args {
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            max_in_flight: self.concurrency,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            retry_max_elapsed: Some(Duration::from_secs(self.retry_secs)),
            https_only: !self.allow_http,
        }
    }
}

pub fn parse() -> Args {
    Args::from_args()
}
