mod audio;
mod clock;
mod config;
mod event;
mod format;
mod input;
mod paths;
mod pattern;
mod scheduler;
mod score;
mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

use crate::audio::AudioCueWorker;
use crate::clock::{CueTable, MatchClock};
use crate::config::Config;
use crate::event::AppEvent;
use crate::scheduler::Snapshot;
use crate::score::Scores;
use crate::status::ScoreboardStatus;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bike polo match clock and scoreboard", long_about = None)]
struct Cli {
    /// Config file to load instead of the per-user default.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Status file to write instead of the per-user default.
    #[arg(long, conflicts_with = "no_status")]
    status_file: Option<PathBuf>,
    /// Do not write a status file.
    #[arg(long)]
    no_status: bool,
    /// Match duration in seconds; overrides `game.duration_secs`.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    duration: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = load_config(&cli);
    let status_path = resolve_status_path(&cli);
    tracing::info!(
        duration = %format::mmss(config.game.duration_secs),
        milestones = config.cues.milestones.len(),
        last10 = %config.cues.last10,
        end = %config.cues.end,
        "cue table loaded"
    );

    // ── Audio cue worker ──────────────────────────────────────────────────────
    let audio = Arc::new(AudioCueWorker::start(
        audio::default_backend(),
        config.tones.clone(),
    )?);

    // ── Clock loop ────────────────────────────────────────────────────────────
    let clock = MatchClock::new(CueTable::from(&config));
    let scores = Scores::default();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, mut snapshot_rx) = watch::channel(Snapshot::capture(&clock, &scores));
    let clock_task = tokio::spawn(scheduler::run(
        clock,
        scores,
        command_rx,
        Arc::clone(&audio),
        snapshot_tx,
    ));

    // ── Console input ─────────────────────────────────────────────────────────
    let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(32);
    input::start(event_tx.clone())?;

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(AppEvent::Shutdown).await;
            }
        });
    }

    println!("polo-scoreboard v{} started", env!("CARGO_PKG_VERSION"));
    println!("f5 start/pause · f6 reset · f7/f8 -/+30s · f9..f12, ctrl+f12 jump · q/w A-/A+ · o/p B-/B+ · quit");

    // ── Event loop ────────────────────────────────────────────────────────────
    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(AppEvent::Control(command)) => {
                    if command_tx.send(command).is_err() {
                        break;
                    }
                }
                Some(AppEvent::Shutdown) | None => break,
            },
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshot_rx.borrow_and_update().clone();
                publish(&snapshot, status_path.as_deref());
            }
        }
    }

    println!("Shutting down");
    drop(command_tx);
    if let Err(e) = clock_task.await {
        tracing::error!("clock loop ended abnormally: {e}");
    }
    audio.stop();
    audio.join();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Loads the config file, falling back to defaults on any error, then applies
/// CLI overrides.
fn load_config(cli: &Cli) -> Config {
    let path = match &cli.config {
        Some(path) => Ok(path.clone()),
        None => paths::config_file_path(),
    };
    let mut config = match path.and_then(|p| config::load_or_default(&p)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config error (using defaults): {e:#}");
            Config::default()
        }
    };
    if let Some(duration) = cli.duration {
        config.game.duration_secs = duration;
    }
    config
}

fn resolve_status_path(cli: &Cli) -> Option<PathBuf> {
    if cli.no_status {
        return None;
    }
    if let Some(path) = &cli.status_file {
        return Some(path.clone());
    }
    match paths::status_file_path() {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("status file disabled: {e:#}");
            None
        }
    }
}

/// Pushes a snapshot to the console and the status file.
fn publish(snapshot: &Snapshot, status_path: Option<&Path>) {
    println!(
        "{}   A {} – {} B   [{}]",
        snapshot.clock(),
        snapshot.scores.team_a,
        snapshot.scores.team_b,
        snapshot.state
    );
    if let Some(path) = status_path {
        status::write_status(path, &ScoreboardStatus::from_snapshot(snapshot));
    }
}
