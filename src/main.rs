//! tsundere-daemon: runs the tsundere module behind a Unix socket
//!
//! The input method framework (or a bridge plugin inside it) forwards
//! commits, key presses, status clicks and language changes over IPC and
//! gets back the filtered text and hotkey decisions.

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fcitx_tsundere::events::StatusEvent;
use fcitx_tsundere::ipc::Server;
use fcitx_tsundere::lifecycle::ShutdownSignal;
use fcitx_tsundere::{Bridge, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "tsundere-daemon starting"
    );

    let settings = Settings::load()?;
    settings.ensure_dirs()?;
    info!(?settings.config_dir, ?settings.desc_dir, "settings loaded");

    let mut shutdown = ShutdownSignal::new()?;

    // Host -> IPC subscribers
    let (event_tx, _event_rx) = broadcast::channel::<StatusEvent>(64);

    let bridge = match Bridge::create(Box::new(settings.store()), event_tx.clone()) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!(error = %e, "failed to initialize tsundere module");
            return Err(e).context("module initialization failed");
        }
    };

    let server = Server::new(&settings.socket_path, bridge, event_tx)?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");
    server.shutdown().await;
    info!("tsundere-daemon stopped");

    Ok(())
}
