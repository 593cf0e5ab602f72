//! Nodeharness CLI - Main Entry Point
//!
//! Runs the admin-console scenarios, standalone endpoint probes, and the
//! staged load test. Configuration comes from the environment; see
//! `Config::from_env` for the variable surface.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use nodeharness_common::Config;

mod scenarios;

/// Nodeharness - admin console automation and load harness
#[derive(Parser)]
#[command(name = "nodeharness")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Run the browser with a visible window instead of headless
    #[arg(long, global = true)]
    headed: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full node lifecycle: login, recreate the node, probe its endpoints
    NodeManagement,

    /// Probe a corrupted endpoint and require the chain to halt early
    BadEndpoint,

    /// Submit invalid credentials and require an explicit rejection
    BadLogin,

    /// Reveal the account API key and fetch NFTs with it
    ApiKeyNft,

    /// Fetch NFTs for a malformed wallet and require a client error
    BadNftRequest,

    /// Run the probe chain once against an endpoint
    Probe {
        /// RPC endpoint URL
        url: String,
    },

    /// Run the staged load test against the configured endpoints
    Load(LoadArgs),

    /// Show version information
    Version,
}

#[derive(Args)]
struct LoadArgs {
    /// Ramp-up duration in seconds
    #[arg(long, default_value_t = 60)]
    ramp_up_secs: u64,

    /// Hold duration in seconds
    #[arg(long, default_value_t = 180)]
    hold_secs: u64,

    /// Ramp-down duration in seconds
    #[arg(long, default_value_t = 60)]
    ramp_down_secs: u64,

    /// Peak virtual-user count
    #[arg(long, default_value_t = 10)]
    vus: u32,

    /// p95 latency threshold in milliseconds
    #[arg(long, default_value_t = 500)]
    p95_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    if let Commands::Version = cli.command {
        println!("nodeharness v{}", nodeharness_common::VERSION);
        return Ok(());
    }

    // The standalone probe needs no environment; everything else does.
    let passed = match cli.command {
        Commands::Probe { url } => scenarios::probe_endpoint(&url).await?,
        command => {
            let config = Config::from_env()?;
            match command {
                Commands::NodeManagement => scenarios::node_management(&config, cli.headed).await?,
                Commands::BadEndpoint => scenarios::bad_endpoint(&config, cli.headed).await?,
                Commands::BadLogin => scenarios::bad_login(&config, cli.headed).await?,
                Commands::ApiKeyNft => scenarios::api_key_nft(&config, cli.headed).await?,
                Commands::BadNftRequest => scenarios::bad_nft_request(&config).await?,
                Commands::Load(args) => {
                    scenarios::load(
                        &config,
                        scenarios::LoadOptions {
                            ramp_up: Duration::from_secs(args.ramp_up_secs),
                            hold: Duration::from_secs(args.hold_secs),
                            ramp_down: Duration::from_secs(args.ramp_down_secs),
                            vus: args.vus,
                            p95_threshold: Duration::from_millis(args.p95_ms),
                        },
                    )
                    .await?
                }
                Commands::Probe { .. } | Commands::Version => unreachable!(),
            }
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
