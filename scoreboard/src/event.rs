use crate::scheduler::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// A console command that mutates the clock or the scores.
    Control(Command),
    /// `quit` typed or Ctrl+C received; the app should stop the audio worker and exit.
    Shutdown,
}
