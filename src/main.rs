//! Management server binary.
//!
//! # Startup
//! ```text
//! --config (optional TOML) → --port override → logging
//!     → Bootstrap::start (bind, register, arm signals, serve)
//!     → RunningService::wait (blocks until shutdown)
//! ```
//!
//! Exit status: 0 after a clean shutdown, 130 when a second signal forces
//! exit, 1 for everything else.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use management_server::config::{load_config, ManagementConfig};
use management_server::grpc::ManagementServer;
use management_server::lifecycle::{Bootstrap, LifecycleError};
use management_server::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "management-server")]
#[command(version, about = "Start the management server", long_about = None)]
struct Cli {
    /// Server port to listen on (e.g. 33073) [default: 33073]
    #[arg(long, allow_negative_numbers = true)]
    port: Option<i64>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ManagementConfig, LifecycleError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ManagementConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("management-server: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.listener.host,
        port = config.listener.port,
        "management-server starting"
    );

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Management server terminated");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(config: ManagementConfig) -> Result<(), LifecycleError> {
    let running = Bootstrap::new(config)
        .start(ManagementServer::new())
        .await?;

    running.wait().await
}
