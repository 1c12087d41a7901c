/// Console control surface.
///
/// A dedicated OS thread reads stdin line by line and forwards each parsed
/// command to the main event loop. One command per line, case-insensitive:
///
/// | Input                      | Action                         |
/// |----------------------------|--------------------------------|
/// | `f5`, `start`, `pause`     | start / pause                  |
/// | `f6`, `reset`              | reset to full duration         |
/// | `f7` / `f8`                | −30 s / +30 s                  |
/// | `f9` … `f12`, `ctrl+f12`   | jump to 00:20, 01:00, 02:00, 05:00, 10:00 |
/// | `+N` / `-N`                | adjust by N seconds            |
/// | `MM:SS`                    | jump to that time              |
/// | `q` / `w`                  | team A −1 / +1                 |
/// | `o` / `p`                  | team B −1 / +1                 |
/// | `quit`, `exit`             | shut down                      |
use std::io::BufRead;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::event::AppEvent;
use crate::format;
use crate::scheduler::Command;
use crate::score::Team;

/// Step used by the `f7`/`f8` time buttons.
pub const ADJUST_STEP_SECS: i64 = 30;

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Control(Command),
    Quit,
}

/// Parses one console line. Returns `None` for anything unrecognised.
pub fn parse_command(line: &str) -> Option<Input> {
    let line = line.trim().to_lowercase();
    let control = |c| Some(Input::Control(c));
    let score = |team, delta| control(Command::Score { team, delta });

    match line.as_str() {
        "f5" | "start" | "pause" => control(Command::StartPause),
        "f6" | "reset" => control(Command::Reset),
        "f7" => control(Command::Adjust(-ADJUST_STEP_SECS)),
        "f8" => control(Command::Adjust(ADJUST_STEP_SECS)),
        "f9" => control(Command::JumpTo(20)),
        "f10" => control(Command::JumpTo(60)),
        "f11" => control(Command::JumpTo(2 * 60)),
        "f12" => control(Command::JumpTo(5 * 60)),
        "ctrl+f12" => control(Command::JumpTo(10 * 60)),
        "q" => score(Team::A, -1),
        "w" => score(Team::A, 1),
        "o" => score(Team::B, -1),
        "p" => score(Team::B, 1),
        "quit" | "exit" => Some(Input::Quit),
        s if s.starts_with('+') || s.starts_with('-') => {
            parse_delta(s).and_then(|d| control(Command::Adjust(d)))
        }
        s if s.contains(':') => {
            format::parse_mmss(s).and_then(|secs| control(Command::JumpTo(secs)))
        }
        _ => None,
    }
}

/// `+N` / `-N` with at least one digit and nothing else.
fn parse_delta(s: &str) -> Option<i64> {
    let digits = &s[1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if s.starts_with('-') { -magnitude } else { magnitude })
}

/// Spawns the stdin reader thread.
///
/// Parsed commands are sent to `tx` with a blocking send; the thread exits on
/// EOF, on a read error, or once the receiver is gone. `quit` sends
/// [`AppEvent::Shutdown`].
pub fn start(tx: mpsc::Sender<AppEvent>) -> Result<()> {
    std::thread::Builder::new()
        .name("console-input".into())
        .spawn(move || read_lines(std::io::stdin().lock(), tx))
        .context("Failed to spawn console input thread")?;
    Ok(())
}

fn read_lines(reader: impl BufRead, tx: mpsc::Sender<AppEvent>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("console input error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let event = match parse_command(&line) {
            Some(Input::Control(command)) => AppEvent::Control(command),
            Some(Input::Quit) => AppEvent::Shutdown,
            None => {
                tracing::warn!(input = line.trim(), "unrecognised command");
                continue;
            }
        };
        let quit = matches!(event, AppEvent::Shutdown);
        if tx.blocking_send(event).is_err() || quit {
            break;
        }
    }
    tracing::debug!("console input closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(line: &str) -> Option<Command> {
        match parse_command(line) {
            Some(Input::Control(c)) => Some(c),
            _ => None,
        }
    }

    // ── parse_command: clock keys ─────────────────────────────────────────────

    #[test]
    fn function_keys_map_to_clock_commands() {
        assert_eq!(control("F5"), Some(Command::StartPause));
        assert_eq!(control("F6"), Some(Command::Reset));
        assert_eq!(control("F7"), Some(Command::Adjust(-30)));
        assert_eq!(control("F8"), Some(Command::Adjust(30)));
    }

    #[test]
    fn jump_presets() {
        assert_eq!(control("f9"), Some(Command::JumpTo(20)));
        assert_eq!(control("f10"), Some(Command::JumpTo(60)));
        assert_eq!(control("f11"), Some(Command::JumpTo(120)));
        assert_eq!(control("f12"), Some(Command::JumpTo(300)));
        assert_eq!(control("Ctrl+F12"), Some(Command::JumpTo(600)));
    }

    #[test]
    fn word_aliases_are_case_insensitive() {
        assert_eq!(control("Start"), Some(Command::StartPause));
        assert_eq!(control("PAUSE"), Some(Command::StartPause));
        assert_eq!(control("  reset  "), Some(Command::Reset));
    }

    // ── parse_command: free-form time ─────────────────────────────────────────

    #[test]
    fn signed_numbers_adjust() {
        assert_eq!(control("+45"), Some(Command::Adjust(45)));
        assert_eq!(control("-10"), Some(Command::Adjust(-10)));
        assert_eq!(control("+0"), Some(Command::Adjust(0)));
        assert_eq!(control("+9223372036854775807"), Some(Command::Adjust(i64::MAX)));
    }

    #[test]
    fn malformed_deltas_are_rejected() {
        assert_eq!(parse_command("+"), None);
        assert_eq!(parse_command("-"), None);
        assert_eq!(parse_command("+1a"), None);
        assert_eq!(parse_command("--5"), None);
        assert_eq!(parse_command("+99999999999999999999999"), None);
    }

    #[test]
    fn mmss_jumps() {
        assert_eq!(control("05:00"), Some(Command::JumpTo(300)));
        assert_eq!(control("0:20"), Some(Command::JumpTo(20)));
        assert_eq!(parse_command("1:75"), None);
    }

    // ── parse_command: scores ─────────────────────────────────────────────────

    #[test]
    fn score_keys() {
        assert_eq!(control("q"), Some(Command::Score { team: Team::A, delta: -1 }));
        assert_eq!(control("W"), Some(Command::Score { team: Team::A, delta: 1 }));
        assert_eq!(control("o"), Some(Command::Score { team: Team::B, delta: -1 }));
        assert_eq!(control("P"), Some(Command::Score { team: Team::B, delta: 1 }));
    }

    // ── parse_command: other ──────────────────────────────────────────────────

    #[test]
    fn quit_words() {
        assert_eq!(parse_command("quit"), Some(Input::Quit));
        assert_eq!(parse_command("EXIT"), Some(Input::Quit));
    }

    #[test]
    fn unrecognised_input_returns_none() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("f13"), None);
        assert_eq!(parse_command("x"), None);
        assert_eq!(parse_command("start now"), None);
    }

    // ── read_lines ────────────────────────────────────────────────────────────

    #[test]
    fn read_lines_forwards_commands_and_stops_at_quit() {
        let (tx, mut rx) = mpsc::channel::<AppEvent>(8);
        let input = "f5\n\nbogus\nw\nquit\nf6\n".as_bytes();
        read_lines(input, tx);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                AppEvent::Control(Command::StartPause),
                AppEvent::Control(Command::Score { team: Team::A, delta: 1 }),
                AppEvent::Shutdown,
            ]
        );
    }

    #[test]
    fn read_lines_stops_when_receiver_is_gone() {
        let (tx, rx) = mpsc::channel::<AppEvent>(8);
        drop(rx);
        // Must return rather than loop forever.
        read_lines("f5\nf5\n".as_bytes(), tx);
    }
}
