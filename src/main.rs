//! area-wmcore
//!
//! Runs the window lifecycle core against the current X display and prints
//! every notification as one JSON object per line.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use area_wmcore::config::Config;
use area_wmcore::wm::x11::{X11Backend, X11ChangeSource};
use area_wmcore::{Driver, WindowManager};

/// Command line options
#[derive(Debug, Default)]
struct Options {
    display: Option<String>,
    /// Print the registry once and exit
    snapshot: bool,
}

impl Options {
    fn parse() -> Result<Self> {
        let mut options = Self::default();
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--snapshot" | "-s" => options.snapshot = true,
                "--display" | "-d" => {
                    options.display = Some(args.next().context("--display needs a value")?);
                }
                other => anyhow::bail!("Unknown argument: {}", other),
            }
        }
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries the event stream
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "area_wmcore=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = Options::parse()?;
    let config = Config::load().context("Failed to load configuration")?;

    let backend = X11Backend::connect(options.display.as_deref(), config.discovery.prefer_client_list)?;
    let workspace = config.workspace_for_screen(backend.screen_geometry());
    let source = X11ChangeSource::new(&backend)?;

    let mut wm = WindowManager::new(backend, workspace)
        .with_settle_cycles(config.discovery.settle_cycles);

    if options.snapshot {
        wm.reconcile()?;
        println!("{}", serde_json::to_string_pretty(&wm.snapshot())?);
        return Ok(());
    }

    let mut events = wm.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to encode event: {}", e),
            }
        }
    });

    // Setup signal handlers for graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            }
            let _ = shutdown_tx.send(()).await;
        });
    }

    // No in-process shell here; the sender only keeps the driver alive
    let (_requests, request_rx) = mpsc::channel(32);
    let driver = Driver::new(wm, source, config.discovery.sweep_interval());

    tokio::select! {
        result = driver.run(request_rx) => {
            if let Err(e) = result {
                error!("Window core stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
