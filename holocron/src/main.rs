use clap::Parser;
use std::path::PathBuf;

mod config;
mod logging;
mod metrics;

use config::{Config, ConfigError};

#[derive(Parser)]
#[command(version, about = "Flattens upstream person records into a CRUD store")]
enum CliCommand {
    /// Run the record API
    Run {
        #[arg(long, env = "HOLOCRON_CONFIG")]
        config: PathBuf,
    },
    /// Load and validate a config file, then exit
    CheckConfig {
        #[arg(long, env = "HOLOCRON_CONFIG")]
        config: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("metrics setup failed: {0}")]
    Metrics(#[from] metrics::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("record service failed: {0}")]
    Records(#[from] records::RecordsError),
}

fn main() {
    let cli = CliCommand::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: CliCommand) -> Result<(), CliError> {
    match cli {
        CliCommand::CheckConfig { config } => {
            Config::from_file(&config)?;
            println!("{} is valid", config.display());
            Ok(())
        }
        CliCommand::Run { config } => {
            let config = Config::from_file(&config)?;

            // Sentry must be set up before the runtime starts
            let _sentry = logging::init(&config.logging);
            metrics::init(config.metrics.as_ref())?;

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            tracing::info!("Starting holocron v{}", env!("CARGO_PKG_VERSION"));
            rt.block_on(records::run(config.records, shutdown_signal()))?;
            tracing::info!("Holocron stopped");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
