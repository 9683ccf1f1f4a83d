use anyhow::Result;
use bandwatch::model::format_ts;
use bandwatch::{Config, RunReport};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bandwatch",
    about = "Site-to-site throughput anomaly alarms for measurement meshes",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one analysis pass over the most recent window
    Run {
        /// Override the analysis window length in days
        #[arg(long)]
        window_days: Option<i64>,

        /// Print alarms to stdout instead of publishing
        #[arg(long)]
        dry_run: bool,

        /// JSON report output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Run continuously on the configured cron schedule
    Watch,

    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    match cli.command {
        Commands::Run {
            window_days,
            dry_run,
            json,
        } => {
            tracing::info!(dry_run, "starting single analysis run");
            let report = bandwatch::run_once(&cfg, window_days, dry_run).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Watch => {
            tracing::info!("starting scheduled watch mode");
            bandwatch::watch(&cfg).await?;
        }
        Commands::ShowConfig => {
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\nBandwatch Analysis Report");
    println!("{:-<60}", "");
    println!(
        "{:<22} : {} - {}",
        "Window",
        format_ts(report.window.from),
        format_ts(report.window.to)
    );
    println!("{:<22} : {}", "Raw samples", report.samples);
    println!("{:<22} : {}", "Bucket aggregates", report.buckets);
    println!("{:<22} : {}", "Decrease candidates", report.decrease_candidates);
    println!("{:<22} : {}", "Increase candidates", report.increase_candidates);
    println!("{:<22} : {}", "Alarms published", report.published);
    println!("{:<22} : {}", "Publish failures", report.publish_failures);
    println!();
}
