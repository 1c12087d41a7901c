/// Match clock state machine.
///
/// `MatchClock` is plain data with no timing or threading of its own: the
/// scheduler calls [`MatchClock::tick`] once per elapsed second and forwards
/// the returned cues to the audio worker. UI-triggered mutations
/// (start/pause, adjust, jump, reset) are funnelled through the same owner.
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::format;
use crate::pattern::TonePattern;

/// Countdown cues cover remaining times `1..=COUNTDOWN_WINDOW_SECS`.
pub const COUNTDOWN_WINDOW_SECS: u32 = 10;

/// Identity of a cue that has already fired in the current countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Exact-second milestone (e.g. 600 for 10:00).
    Milestone(u32),
    /// One of the last-ten-seconds ticks.
    Countdown(u32),
    /// The single t=0 cue.
    EndOfMatch,
}

/// A cue produced by a tick, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredCue {
    pub key: EventKey,
    pub pattern: TonePattern,
}

/// Static cue configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct CueTable {
    pub duration_secs: u32,
    pub milestones: BTreeMap<u32, TonePattern>,
    pub last10: TonePattern,
    pub end: TonePattern,
}

impl From<&Config> for CueTable {
    fn from(config: &Config) -> Self {
        Self {
            duration_secs: config.game.duration_secs,
            milestones: config
                .cues
                .milestones
                .iter()
                .map(|m| (m.at_secs, m.pattern.clone()))
                .collect(),
            last10: config.cues.last10.clone(),
            end: config.cues.end.clone(),
        }
    }
}

/// Coarse clock state for display and the status file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Paused,
    Running,
    /// Remaining time is zero; the clock has stopped itself.
    Expired,
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClockState::Paused => "paused",
            ClockState::Running => "running",
            ClockState::Expired => "expired",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct MatchClock {
    cues: CueTable,
    remaining_secs: u32,
    running: bool,
    fired: HashSet<EventKey>,
}

impl MatchClock {
    pub fn new(cues: CueTable) -> Self {
        Self {
            remaining_secs: cues.duration_secs,
            running: false,
            fired: HashSet::new(),
            cues,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// True while ticks should be scheduled.
    pub fn is_ticking(&self) -> bool {
        self.running && self.remaining_secs > 0
    }

    pub fn state(&self) -> ClockState {
        if self.remaining_secs == 0 {
            ClockState::Expired
        } else if self.running {
            ClockState::Running
        } else {
            ClockState::Paused
        }
    }

    pub fn display(&self) -> String {
        format::mmss(self.remaining_secs)
    }

    pub fn start_pause(&mut self) {
        self.running = !self.running;
        tracing::info!(
            running = self.running,
            clock = %self.display(),
            remaining_secs = self.remaining_secs,
            "timer {}",
            if self.running { "started" } else { "paused" }
        );
    }

    /// Moves the clock by `delta_secs`, clamping at zero.
    pub fn adjust(&mut self, delta_secs: i64) {
        let target = i64::from(self.remaining_secs)
            .saturating_add(delta_secs)
            .clamp(0, i64::from(u32::MAX));
        self.remaining_secs = target as u32;
        tracing::info!(
            delta_secs,
            clock = %self.display(),
            remaining_secs = self.remaining_secs,
            "time adjusted"
        );
        self.purge_future_events();
    }

    /// Sets the remaining time directly.
    pub fn jump_to(&mut self, target_secs: u32) {
        self.remaining_secs = target_secs;
        tracing::info!(
            clock = %self.display(),
            remaining_secs = self.remaining_secs,
            "jumped"
        );
        self.purge_future_events();
    }

    pub fn reset(&mut self) {
        self.remaining_secs = self.cues.duration_secs;
        self.running = false;
        self.fired.clear();
        tracing::info!(clock = %self.display(), "timer reset; cue markers cleared");
    }

    /// Advances the clock by one second and returns the cues that fire at the
    /// new remaining time, in rule order (milestone, countdown, end).
    ///
    /// Does nothing unless the clock is ticking.
    pub fn tick(&mut self) -> Vec<FiredCue> {
        if !self.is_ticking() {
            return Vec::new();
        }

        self.remaining_secs -= 1;
        let now = self.remaining_secs;
        tracing::debug!(clock = %self.display(), remaining_secs = now, "tick");

        let mut fired = Vec::new();

        if let Some(pattern) = self.cues.milestones.get(&now) {
            if self.fired.insert(EventKey::Milestone(now)) {
                tracing::info!(clock = %self.display(), %pattern, "milestone cue");
                fired.push(FiredCue {
                    key: EventKey::Milestone(now),
                    pattern: pattern.clone(),
                });
            }
        }

        if now > 0
            && now <= COUNTDOWN_WINDOW_SECS
            && !self.cues.last10.is_empty()
            && self.fired.insert(EventKey::Countdown(now))
        {
            tracing::info!(remaining_secs = now, pattern = %self.cues.last10, "countdown cue");
            fired.push(FiredCue {
                key: EventKey::Countdown(now),
                pattern: self.cues.last10.clone(),
            });
        }

        if now == 0 {
            if self.fired.insert(EventKey::EndOfMatch) {
                tracing::info!(pattern = %self.cues.end, "end of match cue");
                fired.push(FiredCue {
                    key: EventKey::EndOfMatch,
                    pattern: self.cues.end.clone(),
                });
            }
            self.running = false;
        }

        fired
    }

    /// Re-arms cue markers after a manual time change.
    ///
    /// Every milestone marker except the one at the current remaining time is
    /// dropped: thresholds below it lie ahead of the clock again, and thresholds
    /// above it can only be reached again through another manual change.
    /// Countdown markers are dropped once the clock is outside the countdown
    /// window. `EndOfMatch` stays fired until `reset`.
    fn purge_future_events(&mut self) {
        let before = self.fired.len();
        let remaining = self.remaining_secs;
        self.fired.retain(|key| match *key {
            EventKey::Milestone(at) => at == remaining,
            EventKey::Countdown(_) => remaining <= COUNTDOWN_WINDOW_SECS,
            EventKey::EndOfMatch => true,
        });
        let purged = before - self.fired.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = self.fired.len(), "purged future cue markers");
        }
    }
}
