use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datalink_config::RuntimeConfig;
use datalink_core::{DateKey, RunMode};
use std::path::PathBuf;
use tracing::info;

/// Daily batch export of raw event tables to partitioned Parquet
#[derive(Parser)]
#[command(name = "datalink")]
#[command(version)]
#[command(about = "Daily batch export of raw event tables to partitioned Parquet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one configured export job
    Run {
        /// Job name from the [jobs] section
        #[arg(short, long)]
        job: String,

        /// Run mode; the literal "test" stops before anything is written
        #[arg(short, long, value_name = "MODE")]
        mode: Option<String>,

        /// Process this window instead of deriving one from the clock
        #[arg(short, long, value_name = "YYYYMMDD")]
        date: Option<String>,
    },
    /// List configured job names
    Jobs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let mut config = if let Some(config_path) = &cli.config {
        RuntimeConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        RuntimeConfig::load().context("Failed to load configuration")?
    };

    // CLI override wins over the config file
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }

    datalink::init_tracing(&config.log);

    match cli.command {
        Commands::Run { job, mode, date } => {
            let mode = RunMode::from_flag(mode.as_deref());
            let window_override = date.map(|d| DateKey::parse(&d)).transpose()?;

            let report = datalink::run(&config, &job, mode, window_override).await?;
            info!(
                job = %report.job,
                window = %report.window,
                state = %report.state,
                rows_scanned = report.rows_scanned,
                rows_emitted = report.rows_emitted,
                partitions = report.partitions_written,
                bytes = report.bytes_written,
                "run complete"
            );
            Ok(())
        }
        Commands::Jobs => {
            for name in config.job_names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}
