use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gridpulse::{api, config::Config, pipeline, telemetry};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gridpulse", version, about = "Energy consumption forecasting pipeline")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest raw meter CSVs into the cleaned series
    Ingest,
    /// Build the feature frame from the cleaned series
    Features,
    /// Train all enabled model families and persist artifacts
    Train {
        /// Train only the persistence baseline
        #[arg(long)]
        fast: bool,
    },
    /// Render the metrics summary comparison CSV
    Evaluate,
    /// Serve the prediction API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Ingest => {
            pipeline::run_ingest(&cfg)?;
        }
        Command::Features => {
            pipeline::run_features(&cfg)?;
        }
        Command::Train { fast } => {
            pipeline::run_training(&cfg, fast || pipeline::fast_test_enabled())?;
        }
        Command::Evaluate => {
            pipeline::run_evaluate(&cfg)?;
        }
        Command::Serve => serve(cfg).await?,
    }
    Ok(())
}

async fn serve(cfg: Config) -> Result<()> {
    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "server binding to 0.0.0.0 - service will be accessible from the network; \
            bind to 127.0.0.1 unless behind a firewall/reverse proxy"
        );
    }

    let app = api::router(api::ApiContext::new(cfg));

    info!(%addr, "starting forecast API");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}
