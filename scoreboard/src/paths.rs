/// Canonical file paths for scoreboard data files.
///
/// Both files live in a per-user application directory:
///   - Windows: `%APPDATA%\PoloScoreboard\`
///   - elsewhere: `$XDG_CONFIG_HOME/polo-scoreboard/` or `~/.config/polo-scoreboard/`
///
/// Files:
///   - config.toml  Cue table and tones, read once at startup.
///   - status.toml  Written on every clock/score change for external displays.
use anyhow::{Context, Result};
use std::path::PathBuf;

#[cfg(windows)]
const APP_DIR_NAME: &str = "PoloScoreboard";
#[cfg(not(windows))]
const APP_DIR_NAME: &str = "polo-scoreboard";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Returns the scoreboard application data directory.
pub fn app_data_dir() -> Result<PathBuf> {
    base_dir().map(|base| base.join(APP_DIR_NAME))
}

#[cfg(windows)]
fn base_dir() -> Result<PathBuf> {
    std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .context("APPDATA environment variable not set")
}

#[cfg(not(windows))]
fn base_dir() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg));
    }
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config"))
        .context("neither XDG_CONFIG_HOME nor HOME is set")
}

/// Returns the full path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join(CONFIG_FILE_NAME))
}

/// Returns the full path to the status file.
pub fn status_file_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join(STATUS_FILE_NAME))
}
