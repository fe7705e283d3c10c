mod sample;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sample::BingProbes;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vigil_runtime::{
    HttpProbeClient, HttpProbeClientConfig, ProbeRegistry, ProbeRunner, ProbeRunnerConfig,
    TagMatch,
};

#[derive(Parser)]
#[command(name = "vigil", about = "Production health probes for deployed applications")]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the probe methods that would run
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Run the selected probe methods and print the report as JSON
    Run {
        #[command(flatten)]
        target: TargetArgs,
        /// Maximum number of probe methods in flight
        #[arg(long, env = "VIGIL_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Application the probes are selected for
    #[arg(long, env = "VIGIL_APPLICATION", default_value = "bing")]
    application: String,
    /// Required tag; repeat or comma-separate for several
    #[arg(long = "tag", env = "VIGIL_TAGS", value_delimiter = ',')]
    tags: Vec<String>,
    /// Whether a probe needs any or all of the required tags
    #[arg(long, default_value = "any")]
    tag_match: TagMatch,
    /// Base URL of the application under test
    #[arg(long, env = "VIGIL_BASE_URL", default_value = "https://www.bing.com")]
    base_url: String,
    /// HTTP request timeout in seconds
    #[arg(long, env = "VIGIL_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format);

    match cli.command {
        Commands::List { target } => run_list(&target),
        Commands::Run {
            target,
            concurrency,
        } => run_probes(&target, concurrency).await,
    }
}

/// Initialize tracing from RUST_LOG, defaulting to info
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Print the selected probe methods
fn run_list(target: &TargetArgs) -> miette::Result<()> {
    let runner = create_runner(target, 1)?;

    for method in runner.selected_methods() {
        println!("{}\t{}", method.id(), method.shape());
    }

    Ok(())
}

/// Run the selected probes once; exits non-zero unless every result passed
async fn run_probes(target: &TargetArgs, concurrency: usize) -> miette::Result<()> {
    let runner = create_runner(target, concurrency)?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling running probes");
            signal_token.cancel();
        }
    });

    let report = runner.run(&token).await;

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| miette::miette!("Failed to render report: {}", e))?;
    println!("{}", rendered);

    if !report.is_healthy() {
        return Err(miette::miette!(
            "{} of {} probe methods did not pass",
            report.results.len() - report.passed(),
            report.results.len()
        ));
    }

    info!("All {} probe methods passed", report.results.len());
    Ok(())
}

/// Build the registry of bundled probes and a runner over it
fn create_runner(target: &TargetArgs, concurrency: usize) -> miette::Result<ProbeRunner> {
    let client = HttpProbeClient::new(&HttpProbeClientConfig {
        base_url: target.base_url.clone(),
        timeout: Duration::from_secs(target.timeout_secs),
        ..Default::default()
    })?;

    let mut registry = ProbeRegistry::new();
    registry.register(Arc::new(BingProbes::new(client)))?;

    let required_tags: BTreeSet<String> = target
        .tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let config = ProbeRunnerConfig {
        application: target.application.clone(),
        required_tags,
        tag_match: target.tag_match,
        max_concurrency: concurrency,
    };

    Ok(ProbeRunner::new(Arc::new(registry), config)?)
}
