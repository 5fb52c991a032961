use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use clap::Parser;
use jarvis_core::{BackendClient, Config, ConnectivityMonitor, ViewVariant};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "jarvis")]
#[command(version, about = "Terminal chat client for the Jarvis assistant backend")]
struct Cli {
    /// Backend base URL (overrides config file and JARVIS_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Presentation variant: welcome or classic
    #[arg(long, value_parser = parse_variant)]
    variant: Option<ViewVariant>,

    /// Seconds between backend liveness probes
    #[arg(long)]
    probe_interval: Option<u64>,

    /// Persist the effective settings to the config file and continue
    #[arg(long)]
    save_config: bool,
}

fn parse_variant(s: &str) -> Result<ViewVariant> {
    ViewVariant::from_str(s).ok_or_else(|| anyhow!("unknown variant '{}' (expected welcome or classic)", s))
}

/// Log to a file under the cache dir; the terminal belongs to the UI.
fn init_logging() {
    let Some(log_dir) = dirs::cache_dir().map(|dir| dir.join("jarvis")) else {
        return;
    };
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("jarvis.log"))
    else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(variant) = cli.variant {
        config.variant = variant;
    }
    if let Some(secs) = cli.probe_interval {
        config.probe_interval_secs = secs;
    }
    if cli.save_config {
        let path = config.save()?;
        tracing::info!(path = %path.display(), "saved config");
    }

    tracing::info!(api_url = %config.api_url, variant = config.variant.as_str(), "starting jarvis");

    let client = BackendClient::new(&config.api_url);
    let monitor = Arc::new(ConnectivityMonitor::new(client.clone()));

    let mut events = EventHandler::new();
    events.forward_status(monitor.subscribe());
    let monitor_handle = monitor.clone().spawn(config.probe_interval());

    let mut app = App::new(&config, client, monitor, events.sender());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    // Stop polling; in-flight chat/ingest tasks are simply abandoned
    drop(monitor_handle);

    if let Err(err) = &result {
        tracing::error!(error = %err, "jarvis exited with error");
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
