mod api;
mod app;
mod config;
mod models;
mod store;
mod transform;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use api::MondayClient;
use app::{App, AppMsg, Snapshot};
use config::Config;
use store::ConfigStore;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit it with your API token and board id, then run boardcal.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("boardcal — a calendar view for monday.com boards");
        println!();
        println!("USAGE:");
        println!("  boardcal           Fetch the configured board and print its events");
        println!("  boardcal --init    Generate a default config file");
        println!();
        println!("CONFIG:");
        println!("  File: ~/.config/boardcal/config.toml");
        println!("  Or set env vars: MONDAY_API_TOKEN and MONDAY_BOARD_ID");
        println!();
        println!("  Per-board column selections live under ~/.config/boardcal/boards/");
        println!("  and are edited through the widget host.");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("boardcal=info")),
        )
        .init();

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `boardcal --init` to generate a config file,\n\
         or set MONDAY_API_TOKEN and MONDAY_BOARD_ID environment variables."
    })?;

    let client = MondayClient::new(&config.api_endpoint, &config.api_token)?;
    let store = ConfigStore::open_default()?;
    let app = App::new(Arc::new(client), store);

    // The configured board id stands in for the host's context notification;
    // closing the inbox after it tears the widget down once the pipeline
    // settles.
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(AppMsg::BoardChanged(config.board_id))
        .map_err(|_| anyhow!("controller inbox closed before start"))?;
    drop(tx);

    app.run(rx, render).await;
    Ok(())
}

/// Minimal stdout rendering at the snapshot boundary.
fn render(snapshot: Snapshot<'_>) {
    if snapshot.loading {
        println!("Fetching board…");
        return;
    }
    if snapshot.error {
        eprintln!("Fetch failed — see log output.");
        return;
    }

    println!(
        "{} view — {} event(s)",
        snapshot.display_mode.label(),
        snapshot.events.len()
    );
    for event in snapshot.events {
        let marker = if snapshot.highlighted == Some(event.id.as_str()) {
            '>'
        } else {
            ' '
        };
        println!(
            "{marker} {}  {}",
            event.when.format("%Y-%m-%d %H:%M"),
            event.title.replace('\n', " · ")
        );
    }

    // Detail block for the highlighted event, if any.
    let Some(event) = snapshot
        .events
        .iter()
        .find(|e| snapshot.highlighted == Some(e.id.as_str()))
    else {
        return;
    };
    println!();
    println!("{}", event.name);
    println!("  item {} via {}", event.item_id, event.date_field_id);
    for value in &event.column_values {
        println!("  {}: {}", value.id, value.text.as_deref().unwrap_or("N/A"));
    }
}
