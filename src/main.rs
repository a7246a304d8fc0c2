use cartographer::{
    args::{self, Args, OutputFormat},
    discovery::{Discoverer, DiscoveryStatus},
    error::Error,
    k8s_client::{api::cluster_config::ClusterConfig, K8sClient},
    output,
};
use std::{
    io::{self, Write},
    process,
    str::FromStr,
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

fn init_tracing() {
    let env = std::env::var("CARTOGRAPHER_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = args::parse();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling discovery");
            on_interrupt.cancel();
        }
    });

    // 0: complete, 2: partial, 1: failed
    match run(args, &cancel).await {
        Ok(DiscoveryStatus::Complete) => {}
        Ok(DiscoveryStatus::Partial) => process::exit(2),
        Err(err) => {
            error!(error = %err, "discovery failed");
            process::exit(1);
        }
    }
}

async fn run(args: Args, cancel: &CancellationToken) -> Result<DiscoveryStatus, Error> {
    let config = ClusterConfig::detect(args.kubeconfig.as_deref(), args.context.as_deref())?;
    info!(server = %config.server, "using cluster");
    let client = K8sClient::new(config, &args.client_options())?;
    let discovery = Discoverer::new(Arc::new(client), args.discovery_options())
        .discover(cancel)
        .await?;

    let registry = discovery.registry();
    let rendered = match (&args.resource, args.output) {
        (Some(target), OutputFormat::Json) => output::matches_json(&registry.find(target))?,
        (Some(target), OutputFormat::Table) => output::table(registry.find(target)),
        (None, OutputFormat::Json) => output::report_json(&discovery)?,
        (None, OutputFormat::Table) => output::table(registry.iter()),
    };
    writeln!(io::stdout().lock(), "{}", rendered)?;

    if let Some(target) = &args.resource {
        if registry.find(target).is_empty() {
            warn!(resource = %target, "no discovered resource matches");
        }
    }
    let status = discovery.status();
    if status == DiscoveryStatus::Partial {
        warn!(
            fetch_errors = discovery.fetch_errors().len(),
            malformed_entries = discovery.malformed_entries().len(),
            "discovery is incomplete"
        );
    }
    Ok(status)
}
