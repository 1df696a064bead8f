//! Foreground process: load the dataset once, emit every view's initial
//! payload, then serve interaction events from stdin until EOF. One JSON
//! object per line in both directions.

use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use draftboard::config::AppConfig;
use draftboard::dashboard::Dashboard;
use draftboard::ingest;
use draftboard::runtime::{InteractionEvent, JsonLineSink, OutputSink};
use draftboard::CoreError;

#[derive(Parser, Debug)]
#[command(name = "draftboard", about = "Draft-pick value dashboard core")]
struct Cli {
    /// Player season dataset.
    #[arg(long, default_value = "data/player_seasons.csv")]
    data: PathBuf,

    /// Precomputed pick probability curves.
    #[arg(long, default_value = "data/pick_probabilities.csv")]
    probabilities: PathBuf,

    /// Optional styling/bounds configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        tracing::error!(%error, "startup failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CoreError> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let seasons = ingest::load_player_seasons(&cli.data)?;
    let probabilities = ingest::load_pick_probabilities(&cli.probabilities)?;

    let dashboard = Arc::new(Dashboard::build(seasons, probabilities, config)?);
    tracing::info!(
        views = dashboard.registry().len(),
        players = dashboard.players().len(),
        "dashboard initialized"
    );

    let stdout = io::stdout();
    let mut sink = JsonLineSink::new(stdout.lock());
    for (id, entry) in dashboard.registry().iter() {
        sink.accept(id, &entry.initial);
    }

    let mut session = dashboard.session()?;
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|err| CoreError::config(format!("stdin read failed: {}", err)))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: InteractionEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(%error, "ignoring malformed interaction event");
                continue;
            }
        };
        // A rejected write never reaches the scheduler; the views keep
        // their current state.
        if let Err(error) = session.apply(event, &mut sink) {
            tracing::warn!(%error, "rejected interaction event");
        }
    }

    Ok(())
}
