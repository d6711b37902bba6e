mod accessory;
mod bulb;
mod cli;
mod client;
mod error;
mod http;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use padlink_config::Config;
use padlink_core::{Bridge, Collaborators};

use crate::accessory::LoggingAccessory;
use crate::bulb::BulbServiceClient;
use crate::cli::{Cli, Command, ConfigAction, GlobalOpts};
use crate::client::DaemonClient;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("error: {err}");
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run => run_daemon(&cli.global).await,

        Command::Trigger { button } => {
            daemon_client(&cli.global)?.trigger(button).await?;
            println!("triggered button {button}");
            Ok(())
        }

        Command::Led { r, g, b } => {
            daemon_client(&cli.global)?.set_led(r, g, b).await?;
            println!("led set to ({r}, {g}, {b})");
            Ok(())
        }

        Command::Cycle => {
            daemon_client(&cli.global)?.cycle().await?;
            println!("mode cycled");
            Ok(())
        }

        Command::Status => {
            let status = daemon_client(&cli.global)?.status().await?;
            let link = if status.connected { "connected" } else { "disconnected" };
            println!(
                "device {link}, mode {}, led ({}, {}, {})",
                status.mode, status.color.r, status.color.g, status.color.b
            );
            Ok(())
        }

        Command::Config { action } => match action {
            ConfigAction::Path => {
                println!("{}", padlink_config::config_path().display());
                Ok(())
            }
            ConfigAction::Show => {
                let config = load_config(&cli.global)?;
                let rendered = toml::to_string_pretty(&config)
                    .map_err(|e| CliError::Other(format!("cannot render config: {e}")))?;
                print!("{rendered}");
                Ok(())
            }
        },
    }
}

fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    match &global.config {
        Some(path) => Ok(padlink_config::load_config_from(path)?),
        None => Ok(padlink_config::load_config()?),
    }
}

fn daemon_client(global: &GlobalOpts) -> Result<DaemonClient, CliError> {
    let endpoint = match &global.endpoint {
        Some(url) => url.clone(),
        None => format!("http://{}", load_config(global)?.http.bind),
    };
    DaemonClient::new(&endpoint)
}

// ── Daemon ──────────────────────────────────────────────────────────

async fn run_daemon(global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_config(global)?;
    info!(
        device = %config.device.host,
        port = config.device.port,
        mappings = config.mappings.len(),
        "starting bridge daemon"
    );

    let bulbs = Arc::new(BulbServiceClient::new(
        &config.bulbs.base_url,
        Duration::from_secs(config.bulbs.timeout_secs),
    )?);
    let accessory = Arc::new(LoggingAccessory::new());
    let collaborators = Collaborators {
        bulbs: bulbs.clone(),
        accessory,
        scenes: bulbs,
    };

    let bridge = Bridge::new(config.to_bridge_config(), collaborators);
    bridge.connect();

    // The local accessory layer has no registration handshake; it is
    // ready as soon as it exists.
    bridge.accessory_ready().await;

    let cancel = CancellationToken::new();
    let server = tokio::spawn(http::serve(config.http.bind, bridge.clone(), cancel.clone()));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("interrupt received, shutting down"),
        Err(e) => warn!(error = %e, "cannot listen for interrupt, shutting down"),
    }

    cancel.cancel();
    if let Ok(Err(e)) = server.await {
        warn!(error = %e, "trigger endpoint exited with error");
    }
    bridge.shutdown();

    Ok(())
}
