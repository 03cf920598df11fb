//! Suspendify - resume/suspend coordinator driver
//!
//! CLI entry point for exercising a coordinator from scripts or a canned demo.

use std::io::Read;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use suspendify::cli::{Cli, Command};
use suspendify::config::Config;
use suspendify::coordinator::Coordinator;
use suspendify::script::{ScriptRunner, driver_hooks, parse_script};

const DEMO_POLL_REMAINING_MS: u64 = 30_000;
const DEMO_LINGER: Duration = Duration::from_millis(1_000);

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Demo { poll_ms } => cmd_demo(&config, poll_ms).await,
        Command::Run { file, poll_ms } => cmd_run(&config, file, poll_ms).await,
        Command::Config => cmd_config(&config),
    }
}

async fn cmd_demo(config: &Config, poll_ms: Option<u64>) -> Result<()> {
    let remaining = poll_ms
        .or(config.driver.poll_remaining_ms)
        .unwrap_or(DEMO_POLL_REMAINING_MS);
    info!(remaining_ms = remaining, "Starting demo");

    let coord = Coordinator::new(
        config.coordinator.clone(),
        driver_hooks(Some(Duration::from_millis(remaining))),
    );
    debug!(config = ?coord.config(), "cmd_demo: coordinator ready");

    coord.resume().await?;
    coord.resume().await?;
    coord.suspend(DEMO_LINGER).await?;

    let mut pending = Vec::new();
    for _ in 0..5 {
        pending.push(coord.resume());
        pending.push(coord.suspend(DEMO_LINGER));
    }
    for completion in pending {
        completion.await?;
    }

    println!("{}", serde_json::to_string_pretty(&coord.snapshot())?);
    Ok(())
}

async fn cmd_run(config: &Config, file: Option<std::path::PathBuf>, poll_ms: Option<u64>) -> Result<()> {
    let text = match &file {
        Some(path) => std::fs::read_to_string(path).context(format!("Failed to read script {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read script from stdin")?;
            buf
        }
    };
    let commands = parse_script(&text).context("Failed to parse script")?;

    let remaining = poll_ms.or(config.driver.poll_remaining_ms).map(Duration::from_millis);
    let coord = Coordinator::new(config.coordinator.clone(), driver_hooks(remaining));

    info!(commands = commands.len(), "Running script");
    let mut runner = ScriptRunner::new(coord, std::io::stdout());
    runner.run(&commands).await
}

fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
