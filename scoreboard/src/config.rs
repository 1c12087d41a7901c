use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::pattern::TonePattern;

pub const DEFAULT_GAME_DURATION_SECS: u32 = 15 * 60;
pub const DEFAULT_LAST10_PATTERN: &str = "S";
pub const DEFAULT_END_PATTERN: &str = "L";

pub const DEFAULT_SHORT_FREQUENCY_HZ: u32 = 500;
pub const DEFAULT_SHORT_DURATION_MS: u64 = 500;
pub const DEFAULT_LONG_FREQUENCY_HZ: u32 = 700;
pub const DEFAULT_LONG_DURATION_MS: u64 = 900;
/// Silence after every tone within a pattern.
pub const DEFAULT_TONE_GAP_MS: u64 = 100;

/// Root configuration structure. Deserialized from `config.toml`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub cues: CueConfig,
    #[serde(default)]
    pub tones: ToneConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Length of one period in seconds; also the value restored by reset.
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_GAME_DURATION_SECS,
        }
    }
}

/// Which patterns fire at which remaining times.
#[derive(Debug, Deserialize, Clone)]
pub struct CueConfig {
    #[serde(default = "default_milestones")]
    pub milestones: Vec<MilestoneConfig>,
    /// Played once for each of the last ten seconds. Empty disables it.
    #[serde(default = "default_last10")]
    pub last10: TonePattern,
    /// Played when the clock reaches 00:00.
    #[serde(default = "default_end")]
    pub end: TonePattern,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
            last10: default_last10(),
            end: default_end(),
        }
    }
}

/// A one-shot cue at an exact remaining time.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MilestoneConfig {
    pub at_secs: u32,
    pub pattern: TonePattern,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ToneConfig {
    #[serde(default = "default_short_tone")]
    pub short: ToneSpec,
    #[serde(default = "default_long_tone")]
    pub long: ToneSpec,
    #[serde(default = "default_gap_ms")]
    pub gap_ms: u64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            short: default_short_tone(),
            long: default_long_tone(),
            gap_ms: DEFAULT_TONE_GAP_MS,
        }
    }
}

impl ToneConfig {
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }
}

/// Frequency/duration pair for one tone symbol.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ToneSpec {
    pub frequency_hz: u32,
    pub duration_ms: u64,
}

impl ToneSpec {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Config {
    /// Rejects values that would make the clock or the tone table meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.game.duration_secs == 0 {
            bail!("game.duration_secs must be greater than zero");
        }

        let mut seen = HashSet::new();
        for milestone in &self.cues.milestones {
            if milestone.at_secs == 0 {
                bail!("cues.milestones: at_secs = 0 is reserved for the end-of-match cue");
            }
            if !seen.insert(milestone.at_secs) {
                bail!("cues.milestones: duplicate at_secs = {}", milestone.at_secs);
            }
        }

        for (name, tone) in [("short", &self.tones.short), ("long", &self.tones.long)] {
            if tone.frequency_hz == 0 {
                bail!("tones.{name}.frequency_hz must be greater than zero");
            }
            if tone.duration_ms == 0 {
                bail!("tones.{name}.duration_ms must be greater than zero");
            }
        }
        Ok(())
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read, parsed or validated.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

fn default_duration() -> u32 {
    DEFAULT_GAME_DURATION_SECS
}

fn default_milestones() -> Vec<MilestoneConfig> {
    [(600, "SS"), (300, "SS"), (120, "SSS"), (60, "SSS")]
        .into_iter()
        .map(|(at_secs, pattern)| MilestoneConfig {
            at_secs,
            pattern: parse_builtin(pattern),
        })
        .collect()
}

fn default_last10() -> TonePattern {
    parse_builtin(DEFAULT_LAST10_PATTERN)
}

fn default_end() -> TonePattern {
    parse_builtin(DEFAULT_END_PATTERN)
}

fn default_short_tone() -> ToneSpec {
    ToneSpec {
        frequency_hz: DEFAULT_SHORT_FREQUENCY_HZ,
        duration_ms: DEFAULT_SHORT_DURATION_MS,
    }
}

fn default_long_tone() -> ToneSpec {
    ToneSpec {
        frequency_hz: DEFAULT_LONG_FREQUENCY_HZ,
        duration_ms: DEFAULT_LONG_DURATION_MS,
    }
}

fn default_gap_ms() -> u64 {
    DEFAULT_TONE_GAP_MS
}

/// Built-in patterns are compile-time literals; an unparsable one degrades to silence.
fn parse_builtin(pattern: &str) -> TonePattern {
    pattern.parse().unwrap_or_default()
}
