/// Non-blocking audio cue playback.
///
/// The worker owns one dedicated OS thread that plays [`TonePattern`]s one at a
/// time, in submission order. Callers (the clock loop) only ever push onto an
/// unbounded channel, so playback time never delays a tick.
///
/// Tones go through a [`ToneBackend`]:
///   - Windows: the Win32 `Beep` API.
///   - Elsewhere, with the `rodio-tones` feature: a sine wave on the default
///     output device.
///   - Otherwise: [`TerminalBell`], which rings the terminal bell and sleeps for
///     the tone duration so pattern timing stays the same.
///
/// If the primary backend fails while playing, the worker switches to the
/// fallback for the rest of its lifetime.
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{ToneConfig, ToneSpec};
use crate::pattern::{TonePattern, ToneSymbol};

/// Upper bound on how long the worker waits before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Something that can produce a tone. Playback blocks for the tone's duration.
pub trait ToneBackend: Send {
    fn name(&self) -> &'static str;
    fn play(&mut self, frequency_hz: u32, duration: Duration) -> Result<()>;
}

/// Receives cue patterns without blocking.
pub trait CueSink {
    fn enqueue(&self, pattern: &TonePattern);
}

impl<T: CueSink + ?Sized> CueSink for Arc<T> {
    fn enqueue(&self, pattern: &TonePattern) {
        (**self).enqueue(pattern)
    }
}

// ── Backends ──────────────────────────────────────────────────────────────────

/// Fallback used when no tone generator is available: terminal bell + sleep.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl ToneBackend for TerminalBell {
    fn name(&self) -> &'static str {
        "terminal-bell"
    }

    fn play(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not shorten the tone.
        let _ = writeln!(out, "\x07[BEEP {frequency_hz}Hz {}ms]", duration.as_millis());
        let _ = out.flush();
        drop(out);
        std::thread::sleep(duration);
        Ok(())
    }
}

#[cfg(windows)]
pub use imp::SystemBeep;

#[cfg(windows)]
mod imp {
    use std::time::Duration;

    use anyhow::{Context, Result};
    use windows::Win32::System::Diagnostics::Debug::Beep;

    use super::ToneBackend;

    /// Win32 `Beep`: synchronous tone through the default output device.
    #[derive(Debug, Default)]
    pub struct SystemBeep;

    impl ToneBackend for SystemBeep {
        fn name(&self) -> &'static str {
            "win32-beep"
        }

        fn play(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
            let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
            unsafe { Beep(frequency_hz, millis) }.context("Beep failed")
        }
    }
}

#[cfg(all(not(windows), feature = "rodio-tones"))]
pub use sine::SineTone;

#[cfg(all(not(windows), feature = "rodio-tones"))]
mod sine {
    use std::time::Duration;

    use anyhow::{Context, Result};
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, Sink};

    use super::ToneBackend;

    const VOLUME: f32 = 0.5;

    /// Sine tone on the default output device.
    ///
    /// The output stream is not `Send`, so it is opened per tone on the worker
    /// thread.
    #[derive(Debug, Default)]
    pub struct SineTone;

    pub(super) fn tone(frequency_hz: u32, duration: Duration) -> impl Source<Item = f32> + Send {
        SineWave::new(frequency_hz as f32)
            .take_duration(duration)
            .amplify(VOLUME)
    }

    impl ToneBackend for SineTone {
        fn name(&self) -> &'static str {
            "rodio-sine"
        }

        fn play(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
            let (_stream, handle) =
                OutputStream::try_default().context("no audio output device")?;
            let sink = Sink::try_new(&handle).context("failed to open audio sink")?;
            sink.append(tone(frequency_hz, duration));
            sink.sleep_until_end();
            Ok(())
        }
    }

}

/// Picks the best tone backend for this host. Logs a one-time notice when only
/// the terminal bell is available.
pub fn default_backend() -> Box<dyn ToneBackend> {
    #[cfg(windows)]
    {
        Box::new(SystemBeep)
    }
    #[cfg(all(not(windows), feature = "rodio-tones"))]
    {
        Box::new(SineTone)
    }
    #[cfg(all(not(windows), not(feature = "rodio-tones")))]
    {
        tracing::warn!("no system tone generator on this host; using terminal bell fallback");
        Box::new(TerminalBell)
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

enum Job {
    Play(TonePattern),
    /// Wakes the thread so it observes the stop flag immediately.
    Shutdown,
}

/// Handle to the background audio thread.
pub struct AudioCueWorker {
    tx: mpsc::Sender<Job>,
    stop: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl AudioCueWorker {
    /// Spawns the worker thread using `backend`, falling back to [`TerminalBell`].
    pub fn start(backend: Box<dyn ToneBackend>, tones: ToneConfig) -> Result<Self> {
        Self::with_fallback(backend, Box::new(TerminalBell), tones)
    }

    pub fn with_fallback(
        primary: Box<dyn ToneBackend>,
        fallback: Box<dyn ToneBackend>,
        tones: ToneConfig,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let stop = Arc::new(AtomicBool::new(false));

        let player = PatternPlayer {
            primary: Some(primary),
            fallback,
            tones,
        };
        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::Builder::new()
            .name("audio-cues".into())
            .spawn(move || run(rx, thread_stop, player))
            .context("Failed to spawn audio cue thread")?;

        Ok(Self {
            tx,
            stop,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Queues `pattern` for playback. Empty patterns and calls after
    /// [`stop`](Self::stop) are ignored.
    pub fn enqueue(&self, pattern: &TonePattern) {
        if pattern.is_empty() || self.stop.load(Ordering::Relaxed) {
            return;
        }
        // A send error means the thread is gone; dropping the cue is fine.
        let _ = self.tx.send(Job::Play(pattern.clone()));
    }

    /// Asks the thread to exit after the pattern it is currently playing.
    /// Pending patterns are abandoned. Idempotent and never blocks.
    pub fn stop(&self) {
        if self.stop.swap(true, Ordering::Relaxed) {
            return;
        }
        let _ = self.tx.send(Job::Shutdown);
    }

    /// Waits for the thread to exit. Call after [`stop`](Self::stop).
    pub fn join(&self) {
        let handle = match self.thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("audio cue thread panicked");
            }
        }
    }
}

impl CueSink for AudioCueWorker {
    fn enqueue(&self, pattern: &TonePattern) {
        AudioCueWorker::enqueue(self, pattern);
    }
}

impl Drop for AudioCueWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(rx: mpsc::Receiver<Job>, stop: Arc<AtomicBool>, mut player: PatternPlayer) {
    tracing::debug!("audio cue thread started");
    while !stop.load(Ordering::Relaxed) {
        let pattern = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Job::Play(pattern)) => pattern,
            Ok(Job::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => continue,
        };
        player.play(&pattern);
    }
    tracing::debug!("audio cue thread exited");
}

/// Plays whole patterns on the worker thread.
struct PatternPlayer {
    /// `None` once the primary backend has failed.
    primary: Option<Box<dyn ToneBackend>>,
    fallback: Box<dyn ToneBackend>,
    tones: ToneConfig,
}

impl PatternPlayer {
    fn play(&mut self, pattern: &TonePattern) {
        tracing::debug!(%pattern, "playing pattern");
        let gap = self.tones.gap();
        for (i, symbol) in pattern.symbols().iter().enumerate() {
            let spec = self.spec_for(*symbol);
            tracing::trace!(tone = i + 1, ?symbol, "tone");
            self.play_tone(spec);
            std::thread::sleep(gap);
        }
    }

    fn spec_for(&self, symbol: ToneSymbol) -> ToneSpec {
        match symbol {
            ToneSymbol::Short => self.tones.short,
            ToneSymbol::Long => self.tones.long,
        }
    }

    fn play_tone(&mut self, spec: ToneSpec) {
        if let Some(primary) = self.primary.as_mut() {
            match primary.play(spec.frequency_hz, spec.duration()) {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(
                        backend = primary.name(),
                        fallback = self.fallback.name(),
                        "tone backend failed, switching to fallback: {e:#}"
                    );
                    self.primary = None;
                }
            }
        }
        if let Err(e) = self.fallback.play(spec.frequency_hz, spec.duration()) {
            tracing::warn!(backend = self.fallback.name(), "fallback tone failed: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    type Played = Arc<Mutex<Vec<(u32, Duration)>>>;

    /// Records every tone instead of producing sound.
    struct Recording {
        played: Played,
        fail: bool,
    }

    impl ToneBackend for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn play(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
            self.played.lock().unwrap().push((frequency_hz, duration));
            if self.fail {
                anyhow::bail!("no audio device");
            }
            Ok(())
        }
    }

    fn recorder(fail: bool) -> (Box<dyn ToneBackend>, Played) {
        let played = Played::default();
        let backend = Box::new(Recording {
            played: Arc::clone(&played),
            fail,
        });
        (backend, played)
    }

    fn fast_tones() -> ToneConfig {
        ToneConfig {
            short: ToneSpec { frequency_hz: 500, duration_ms: 1 },
            long: ToneSpec { frequency_hz: 700, duration_ms: 2 },
            gap_ms: 0,
        }
    }

    fn pattern(s: &str) -> TonePattern {
        s.parse().unwrap()
    }

    /// Polls until `played` holds `n` tones or two seconds pass.
    fn wait_for(played: &Played, n: usize) -> Vec<(u32, Duration)> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let snapshot = played.lock().unwrap().clone();
            if snapshot.len() >= n || Instant::now() > deadline {
                return snapshot;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn frequencies(tones: &[(u32, Duration)]) -> Vec<u32> {
        tones.iter().map(|(f, _)| *f).collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────────

    #[test]
    fn patterns_play_in_submission_order_without_interleaving() {
        let (primary, played) = recorder(false);
        let (fallback, fallback_played) = recorder(false);
        let worker = AudioCueWorker::with_fallback(primary, fallback, fast_tones()).unwrap();

        worker.enqueue(&pattern("SS"));
        worker.enqueue(&pattern("L"));

        let tones = wait_for(&played, 3);
        assert_eq!(frequencies(&tones), vec![500, 500, 700]);
        assert_eq!(tones[2].1, Duration::from_millis(2));
        assert!(fallback_played.lock().unwrap().is_empty());

        worker.stop();
        worker.join();
    }

    #[test]
    fn many_patterns_keep_fifo_order() {
        let (primary, played) = recorder(false);
        let (fallback, _) = recorder(false);
        let worker = AudioCueWorker::with_fallback(primary, fallback, fast_tones()).unwrap();

        for p in ["S", "L", "SL", "LS"] {
            worker.enqueue(&pattern(p));
        }

        let tones = wait_for(&played, 6);
        assert_eq!(frequencies(&tones), vec![500, 700, 500, 700, 700, 500]);

        worker.stop();
        worker.join();
    }

    // ── enqueue edge cases ────────────────────────────────────────────────────

    #[test]
    fn empty_pattern_is_ignored() {
        let (primary, played) = recorder(false);
        let (fallback, _) = recorder(false);
        let worker = AudioCueWorker::with_fallback(primary, fallback, fast_tones()).unwrap();

        worker.enqueue(&TonePattern::default());
        worker.enqueue(&pattern("S"));

        let tones = wait_for(&played, 1);
        assert_eq!(frequencies(&tones), vec![500]);

        worker.stop();
        worker.join();
    }

    #[test]
    fn enqueue_after_stop_is_a_no_op() {
        let (primary, played) = recorder(false);
        let (fallback, _) = recorder(false);
        let worker = AudioCueWorker::with_fallback(primary, fallback, fast_tones()).unwrap();

        worker.stop();
        worker.join();
        worker.enqueue(&pattern("SSS"));

        assert!(played.lock().unwrap().is_empty());
    }

    // ── stop ──────────────────────────────────────────────────────────────────

    #[test]
    fn stop_is_idempotent_and_join_returns() {
        let (primary, _) = recorder(false);
        let (fallback, _) = recorder(false);
        let worker = AudioCueWorker::with_fallback(primary, fallback, fast_tones()).unwrap();

        worker.stop();
        worker.stop();
        worker.join();
        // A second join finds no thread and returns immediately.
        worker.join();
        worker.stop();
    }

    #[test]
    fn stop_does_not_block_the_caller() {
        let (primary, _) = recorder(false);
        let (fallback, _) = recorder(false);
        let mut tones = fast_tones();
        tones.long.duration_ms = 200;
        tones.gap_ms = 200;
        let worker = AudioCueWorker::with_fallback(primary, fallback, tones).unwrap();

        worker.enqueue(&pattern("LLLL"));
        let started = Instant::now();
        worker.stop();
        assert!(started.elapsed() < Duration::from_millis(100));
        worker.join();
    }

    // ── fallback ──────────────────────────────────────────────────────────────

    #[test]
    fn failing_backend_switches_to_fallback_for_good() {
        let (primary, primary_played) = recorder(true);
        let (fallback, fallback_played) = recorder(false);
        let worker = AudioCueWorker::with_fallback(primary, fallback, fast_tones()).unwrap();

        worker.enqueue(&pattern("SL"));
        worker.enqueue(&pattern("S"));

        let tones = wait_for(&fallback_played, 3);
        assert_eq!(frequencies(&tones), vec![500, 700, 500]);
        // The primary was tried once, then abandoned.
        assert_eq!(primary_played.lock().unwrap().len(), 1);

        worker.stop();
        worker.join();
    }

    #[test]
    fn terminal_bell_sleeps_for_the_tone_duration() {
        let mut bell = TerminalBell;
        let started = Instant::now();
        bell.play(500, Duration::from_millis(30)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
