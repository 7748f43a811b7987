use std::{future::Future, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use panel_client::{
    load_settings, run_panel, select_transport, MissingColorMath, Panel, PanelEvent,
    RegistrationTable,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod console;

use commands::parse_command;
use console::ConsoleSurface;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./panel.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    /// Skip the websocket and poll the fallback endpoint.
    #[arg(long)]
    no_push: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings =
        load_settings(args.config.as_deref()).context("failed to load panel settings")?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if args.no_push {
        settings.push_enabled = false;
    }
    settings.validate()?;

    let routes = Arc::new(RegistrationTable::from_settings(&settings));
    let (events_tx, events_rx) = mpsc::channel(256);
    let transport = select_transport(&settings, Arc::clone(&routes), events_tx.clone())
        .await
        .context("failed to set up transport")?;
    info!(mode = %transport.mode, topics = routes.len(), "panel: ready");

    let panel = Panel::new(
        settings,
        MissingColorMath,
        routes,
        Arc::clone(&transport.sink),
        Box::new(ConsoleSurface::default()),
    );
    tokio::spawn(run_panel(panel, events_rx));

    serve(read_gestures(events_tx.clone()), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for ctrl-c");
        }
    })
    .await
}

/// Runs until `shutdown` resolves. Closing stdin ends gesture input but
/// leaves the transport and panel running.
async fn serve<G, S>(gestures: G, shutdown: S) -> Result<()>
where
    G: Future<Output = Result<()>>,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    tokio::select! {
        res = gestures => {
            res?;
            info!("panel: stdin closed, running until interrupted");
            shutdown.await;
        }
        _ = &mut shutdown => info!("panel: interrupted"),
    }
    Ok(())
}

async fn read_gestures(events: mpsc::Sender<PanelEvent>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_command(&line) {
            Ok(Some(gesture)) => {
                if events.send(PanelEvent::Gesture(gesture)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "ignoring command"),
        }
    }
    Ok(())
}
