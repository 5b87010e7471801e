//! gpu-finder - probe Compute Engine zones for GPU capacity.

#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use gpu_finder::operation::{DEFAULT_OPERATION_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS};
use gpu_finder::providers::gcp::DEFAULT_API_BASE_URL;
use gpu_finder::provision::group_by_region;
use gpu_finder::report::{approved_zones_table, report_table};
use gpu_finder::{survey, FinderConfig, Gcp, PollPolicy};

/// gpu-finder - find zones with capacity for a GPU machine shape.
#[derive(Parser)]
#[command(name = "gpu-finder")]
#[command(about = "Probe Compute Engine zones for GPU capacity by creating trial instances")]
struct Cli {
    /// Path to the JSON survey configuration.
    #[arg(long, short = 'c', default_value = "gpu-config.json")]
    config: PathBuf,

    /// OAuth2 access token (or set `GOOGLE_OAUTH_ACCESS_TOKEN`).
    /// Falls back to `gcloud auth print-access-token` when empty.
    #[arg(
        long,
        env = "GOOGLE_OAUTH_ACCESS_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    access_token: String,

    /// Compute Engine API root.
    #[arg(long, env = "GPU_FINDER_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Seconds between operation status fetches.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval_secs: u64,

    /// Seconds to wait for a single create or delete operation.
    #[arg(long, default_value_t = DEFAULT_OPERATION_TIMEOUT_SECS)]
    operation_timeout_secs: u64,

    /// Print results as JSON instead of a table.
    #[arg(long, default_value = "false")]
    json: bool,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and delete trial instances in every qualifying region (default).
    Probe,

    /// List qualifying zones without creating anything.
    Zones,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = FinderConfig::load(&cli.config)
        .await
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let access_token = resolve_access_token(&cli)?;
    let provider = Gcp::with_base_url(access_token, cli.api_base_url.as_str())
        .context("Failed to create Compute Engine client")?;

    let policy = PollPolicy {
        interval: Duration::from_secs(cli.poll_interval_secs),
        timeout: Duration::from_secs(cli.operation_timeout_secs),
    };

    match cli.command.unwrap_or(Commands::Probe) {
        Commands::Probe => {
            let report = survey::run(&provider, &config, policy).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("\n{}", report_table(&report));

            let regions = report.successful_regions();
            if regions.is_empty() {
                println!(
                    "\n{} No region could host {} with {} x {}",
                    "✗".red(),
                    report.machine_type,
                    report.accelerator_count,
                    report.accelerator_type
                );
            } else {
                println!(
                    "\n{} Capacity found in {} region(s): {}",
                    "✓".green(),
                    regions.len(),
                    regions.join(", ")
                );
            }
        }

        Commands::Zones => {
            let approved = survey::qualifying_zones(&provider, &config).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&approved)?);
                return Ok(());
            }

            let groups = group_by_region(approved);
            println!("\n{}", approved_zones_table(&groups));
            println!(
                "\n{} {} region(s) qualify; run `gpu-finder probe` to test capacity",
                "→".cyan(),
                groups.len()
            );
        }
    }

    Ok(())
}

fn resolve_access_token(cli: &Cli) -> Result<String> {
    let token = cli.access_token.trim();
    if !token.is_empty() {
        return Ok(token.to_string());
    }

    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .context("No access token given and `gcloud` could not be run")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("gcloud error: {}. Run: `gcloud auth login`", stderr.trim());
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        anyhow::bail!("gcloud returned an empty access token. Run: `gcloud auth login`");
    }

    Ok(token)
}
