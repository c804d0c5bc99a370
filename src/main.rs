//! filegate: a configuration-driven static file server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ listener (http / https)
//!                        │  request id + trace span
//!                        ▼
//!                      header injection (listener headers, set-if-absent)
//!                        ▼
//!                      gzip (when enabled and accepted)
//!                        ▼
//!                      status interceptor ──▶ override handler / reason phrase
//!                        ▼
//!                      routing table (longest prefix, prefix stripped)
//!                        ▼
//!                      per-serve headers → file server | redirect | fixed error
//! ```

use std::path::PathBuf;

use clap::Parser;

use filegate::config::{self, loader, ConfigError, ServerConfig};
use filegate::lifecycle::{wait_for_termination, Shutdown};
use filegate::observability::logging;
use filegate::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "filegate", version, about = "Configuration-driven static file server")]
struct Cli {
    /// TOML configuration file; without one, TARGET is served on --addr.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit without binding.
    #[arg(long)]
    check: bool,

    /// Listen address used when no configuration file is given.
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Log filter, overridden by RUST_LOG.
    #[arg(long, default_value = logging::DEFAULT_FILTER)]
    log_level: String,

    /// Directory served when no configuration file is given.
    #[arg(default_value = ".")]
    target: PathBuf,
}

fn load(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    match &cli.config {
        Some(path) => config::load_config(path),
        None => {
            let mut config = ServerConfig::for_directory(cli.addr.clone(), &cli.target);
            config.sanitise();
            loader::prepare(config)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    tracing::info!("filegate v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match load(&cli) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                tracing::error!(error = %error, "Invalid configuration");
            }
            return Err(ConfigError::Validation(errors).into());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    tracing::info!(
        listeners = config.listeners.len(),
        serves = config.serves.len(),
        redirects = config.redirects.len(),
        overrides = config.errors.len(),
        override_status = ?config.override_status,
        "Configuration loaded"
    );

    let server = HttpServer::new(&config)?;
    if cli.check {
        tracing::info!("Config check passed");
        return Ok(());
    }

    let shutdown = Shutdown::new();
    let running = server.start(&shutdown).await?;

    let listeners = running.wait();
    tokio::pin!(listeners);
    tokio::select! {
        result = &mut listeners => result?,
        _ = wait_for_termination() => {
            shutdown.trigger();
            listeners.await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
