/// Clock scheduling loop.
///
/// A single task owns the [`MatchClock`] and [`Scores`]; every mutation, UI
/// command or tick, happens here, so no lock guards the clock state.
///
/// Ticks follow a monotonic deadline that advances by exactly one second per
/// tick, independent of how long the tick itself took. While the clock is not
/// ticking the loop just waits for the next command, and the deadline is
/// re-anchored to `now + 1s` when ticking resumes.
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Duration, Instant};

use crate::audio::CueSink;
use crate::clock::{ClockState, MatchClock};
use crate::format;
use crate::score::{Scores, Team};

pub const TICK: Duration = Duration::from_secs(1);

/// State-mutation requests from the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartPause,
    Adjust(i64),
    JumpTo(u32),
    Reset,
    Score { team: Team, delta: i32 },
}

/// Read-only view of the scoreboard published after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub remaining_secs: u32,
    pub state: ClockState,
    pub scores: Scores,
}

impl Snapshot {
    pub fn capture(clock: &MatchClock, scores: &Scores) -> Self {
        Self {
            remaining_secs: clock.remaining_secs(),
            state: clock.state(),
            scores: *scores,
        }
    }

    pub fn clock(&self) -> String {
        format::mmss(self.remaining_secs)
    }
}

/// Runs until every [`Command`] sender has been dropped.
pub async fn run<C: CueSink>(
    mut clock: MatchClock,
    mut scores: Scores,
    mut commands: mpsc::UnboundedReceiver<Command>,
    cues: C,
    snapshots: watch::Sender<Snapshot>,
) {
    let mut next_tick = Instant::now() + TICK;
    snapshots.send_replace(Snapshot::capture(&clock, &scores));

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                let was_ticking = clock.is_ticking();
                apply(&mut clock, &mut scores, command);
                if !was_ticking && clock.is_ticking() {
                    next_tick = Instant::now() + TICK;
                }
            }
            _ = time::sleep_until(next_tick), if clock.is_ticking() => {
                for cue in clock.tick() {
                    tracing::debug!(key = ?cue.key, pattern = %cue.pattern, "cue submitted");
                    cues.enqueue(&cue.pattern);
                }
                next_tick += TICK;
            }
        }
        snapshots.send_if_modified(|current| {
            let next = Snapshot::capture(&clock, &scores);
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    tracing::debug!("clock loop stopped");
}

fn apply(clock: &mut MatchClock, scores: &mut Scores, command: Command) {
    match command {
        Command::StartPause => clock.start_pause(),
        Command::Adjust(delta) => clock.adjust(delta),
        Command::JumpTo(secs) => clock.jump_to(secs),
        Command::Reset => clock.reset(),
        Command::Score { team, delta } => scores.change(team, delta),
    }
}
