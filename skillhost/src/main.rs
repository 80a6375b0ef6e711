mod config;
mod logging;
mod statsd;

use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about = "Hosts custom skills for a search indexing pipeline")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Merge street name, house number and city into a single address
    AddressMerge {
        /// Path to the YAML config file
        #[arg(long, short)]
        config: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsInitError),
    #[error("config file has no `{0}` section")]
    MissingSection(&'static str),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("address merge skill failed: {0}")]
    AddressMerge(#[from] address_merge::errors::AddressMergeError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        CliCommand::AddressMerge { config } => {
            let config = Config::from_file(&config)?;
            let _sentry_guard = logging::init(&config.common.logging)?;

            if let Some(metrics_config) = &config.common.metrics {
                statsd::init(metrics_config)?;
            }

            let address_merge_config = config
                .address_merge
                .ok_or(CliError::MissingSection("address_merge"))?;

            tracing::info!("Starting address-merge");
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(address_merge::run(address_merge_config))?;
        }
    }

    Ok(())
}
