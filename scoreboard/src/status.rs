use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clock::ClockState;
use crate::scheduler::Snapshot;

/// Scoreboard status written to `status.toml` on every clock or score change.
/// External displays (stream overlays, a second screen) read this file; the
/// scoreboard itself never reads it back.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoreboardStatus {
    /// Binary version (set from Cargo.toml at compile time).
    pub version: String,
    pub state: ClockState,
    /// Remaining time as `MM:SS`.
    pub clock: String,
    pub remaining_secs: u32,
    pub team_a: u32,
    pub team_b: u32,
    /// RFC 3339 timestamp of the change that produced this status.
    pub updated_at: String,
}

impl ScoreboardStatus {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: snapshot.state,
            clock: snapshot.clock(),
            remaining_secs: snapshot.remaining_secs,
            team_a: snapshot.scores.team_a,
            team_b: snapshot.scores.team_b,
            updated_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Logs errors rather than returning them: a status write failure must never
/// disturb the clock.
pub fn write_status(path: &Path, status: &ScoreboardStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("failed to create directory {}: {e}", parent.display());
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                tracing::warn!("failed to write status file {}: {e}", path.display());
            }
        }
        Err(e) => tracing::warn!("failed to serialize status: {e}"),
    }
}
