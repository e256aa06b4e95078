//! Playback timer
//!
//! A stopwatch measured against a fixed duration. The timer owns a tokio
//! task that ticks at a fixed period; while playing, each tick adds the
//! monotonic time since the previous tick, emits [`ReaderEvent::TimerTick`]
//! and persists the elapsed time. The first tick at or past the duration
//! stops the timer and emits a single `TimerStopped { finished: true }`.
//!
//! The previous-tick reference is cleared whenever the timer starts playing
//! or pauses, so time spent paused never counts and the first tick after a
//! resume adds nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lectio_common::events::{EventBus, ReaderEvent, TimerState};
use lectio_common::time::{self, progress_fraction};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::db::{SessionKey, SessionStore};

/// Point-in-time view of a timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerStatus {
    pub state: TimerState,
    pub elapsed: f64,
    pub duration: f64,
    pub progress: f64,
}

struct TimerCore {
    state: TimerState,
    elapsed: Duration,
    duration: Duration,
    last_tick: Option<Instant>,
}

enum TickOutcome {
    /// Paused: nothing changed
    Idle,
    /// Elapsed advanced; persist it
    Progress(f64),
    /// Duration reached on this tick
    Finished(f64),
    /// Stopped explicitly; the task should exit
    Stopped,
}

impl TimerCore {
    fn on_tick(&mut self, now: Instant, events: &EventBus) -> TickOutcome {
        match self.state {
            TimerState::Stopped => return TickOutcome::Stopped,
            TimerState::Paused => return TickOutcome::Idle,
            TimerState::Playing => {}
        }

        if let Some(previous) = self.last_tick {
            self.elapsed += now.saturating_duration_since(previous);
        }
        self.last_tick = Some(now);

        let elapsed = self.elapsed.as_secs_f64();
        let duration = self.duration.as_secs_f64();

        if self.elapsed < self.duration {
            let progress = progress_fraction(elapsed, duration);
            trace!("Timer tick: {:.3}s / {:.3}s", elapsed, duration);
            events.emit_lossy(ReaderEvent::TimerTick {
                elapsed,
                duration,
                progress,
                timestamp: time::now(),
            });
            TickOutcome::Progress(elapsed)
        } else {
            self.state = TimerState::Stopped;
            self.last_tick = None;
            debug!("Timer finished after {:.3}s", elapsed);
            events.emit_lossy(ReaderEvent::TimerStopped {
                finished: true,
                elapsed,
                timestamp: time::now(),
            });
            TickOutcome::Finished(elapsed)
        }
    }

    fn status(&self) -> TimerStatus {
        let elapsed = self.elapsed.as_secs_f64();
        let duration = self.duration.as_secs_f64();
        TimerStatus {
            state: self.state,
            elapsed,
            duration,
            progress: progress_fraction(elapsed, duration),
        }
    }
}

/// Elapsed-time tracker with its own tick task
///
/// Must be created inside a tokio runtime. Dropping the timer aborts the
/// task; use [`PlaybackTimer::shutdown`] to also wait for it to exit.
pub struct PlaybackTimer {
    core: Arc<Mutex<TimerCore>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackTimer {
    /// Create a paused timer at `current_time` seconds and start ticking
    pub fn start(
        duration: f64,
        current_time: f64,
        tick_interval: Duration,
        events: EventBus,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        let core = Arc::new(Mutex::new(TimerCore {
            state: TimerState::Paused,
            elapsed: seconds(current_time),
            duration: seconds(duration),
            last_tick: None,
        }));

        let period = tick_interval.max(Duration::from_millis(1));
        let task = tokio::spawn(run_ticks(core.clone(), period, events, session));

        debug!(
            "Timer created: duration {:.3}s, resuming at {:.3}s, tick {:?}",
            duration, current_time, period
        );

        Self {
            core,
            task: Mutex::new(Some(task)),
        }
    }

    fn core(&self) -> MutexGuard<'_, TimerCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start or resume counting; ignored once stopped
    pub fn play(&self) {
        let mut core = self.core();
        if core.state == TimerState::Stopped {
            return;
        }
        core.state = TimerState::Playing;
        core.last_tick = None;
        debug!("Timer playing at {:.3}s", core.elapsed.as_secs_f64());
    }

    /// Stop counting; ignored once stopped
    pub fn pause(&self) {
        let mut core = self.core();
        if core.state == TimerState::Stopped {
            return;
        }
        core.state = TimerState::Paused;
        core.last_tick = None;
        debug!("Timer paused at {:.3}s", core.elapsed.as_secs_f64());
    }

    /// Stop permanently; the tick task exits on its next tick
    pub fn stop(&self) {
        let mut core = self.core();
        core.state = TimerState::Stopped;
        core.last_tick = None;
    }

    /// Zero the elapsed time without touching state or the tick task
    pub fn reset(&self) {
        self.core().elapsed = Duration::ZERO;
    }

    pub fn is_finished(&self) -> bool {
        let core = self.core();
        core.elapsed >= core.duration
    }

    pub fn state(&self) -> TimerState {
        self.core().state
    }

    /// Elapsed seconds
    pub fn current_time(&self) -> f64 {
        self.core().elapsed.as_secs_f64()
    }

    /// Target duration in seconds
    pub fn duration(&self) -> f64 {
        self.core().duration.as_secs_f64()
    }

    pub fn progress(&self) -> f64 {
        self.core().status().progress
    }

    pub fn status(&self) -> TimerStatus {
        self.core().status()
    }

    /// Stop the timer and wait for the tick task to exit
    ///
    /// Once this returns no further tick is emitted or persisted.
    pub async fn shutdown(&self) {
        self.stop();
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for PlaybackTimer {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

async fn run_ticks(
    core: Arc<Mutex<TimerCore>>,
    period: Duration,
    events: EventBus,
    session: Arc<dyn SessionStore>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let outcome = {
            let mut core = core.lock().unwrap_or_else(PoisonError::into_inner);
            core.on_tick(Instant::now(), &events)
        };

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Progress(elapsed) => persist_elapsed(session.as_ref(), elapsed).await,
            TickOutcome::Finished(elapsed) => {
                persist_elapsed(session.as_ref(), elapsed).await;
                break;
            }
            TickOutcome::Stopped => break,
        }
    }

    trace!("Timer tick task exited");
}

async fn persist_elapsed(session: &dyn SessionStore, elapsed: f64) {
    if let Err(e) = session.store(SessionKey::TimerElapsed, elapsed).await {
        warn!("Failed to persist timer elapsed time: {}", e);
    }
}

/// Seconds to a `Duration`; negative or non-finite input becomes zero
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemorySessionStore;
    use tokio::sync::broadcast::error::TryRecvError;

    const TICK: Duration = Duration::from_millis(100);

    fn timer(duration: f64, current_time: f64) -> (PlaybackTimer, EventBus, Arc<MemorySessionStore>) {
        let bus = EventBus::new(1000);
        let session = Arc::new(MemorySessionStore::new());
        let timer = PlaybackTimer::start(duration, current_time, TICK, bus.clone(), session.clone());
        (timer, bus, session)
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<ReaderEvent>) -> Vec<ReaderEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_paused() {
        let (timer, bus, _) = timer(10.0, 0.0);
        let mut rx = bus.subscribe();

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.current_time(), 0.0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finishes_exactly_once() {
        let (timer, bus, session) = timer(10.0, 0.0);
        let mut rx = bus.subscribe();

        timer.play();
        tokio::time::sleep(Duration::from_secs(11)).await;

        let events = drain(&mut rx);
        let stops: Vec<_> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, ReaderEvent::TimerStopped { .. }))
            .collect();
        assert_eq!(stops.len(), 1);
        assert!(matches!(stops[0].1, ReaderEvent::TimerStopped { finished: true, .. }));
        // Stop is the final event
        assert_eq!(stops[0].0, events.len() - 1);
        assert!(events.len() > 50);

        assert_eq!(timer.state(), TimerState::Stopped);
        assert!(timer.is_finished());
        assert_eq!(timer.progress(), 1.0);

        let persisted = session.load(SessionKey::TimerElapsed).await.unwrap().unwrap();
        assert!(persisted >= 10.0);

        // Nothing more after finishing
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_progress_below_one() {
        let (timer, bus, _) = timer(4.0, 0.0);
        let mut rx = bus.subscribe();

        timer.play();
        tokio::time::sleep(Duration::from_secs(5)).await;

        for event in drain(&mut rx) {
            if let ReaderEvent::TimerTick { elapsed, duration, progress, .. } = event {
                assert!(elapsed < duration);
                assert!((0.0..1.0).contains(&progress));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_time_does_not_count() {
        let (timer, _, _) = timer(60.0, 0.0);

        timer.play();
        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.pause();
        let at_pause = timer.current_time();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(timer.current_time(), at_pause);

        timer.play();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let elapsed = timer.current_time();
        assert!(elapsed > 2.6 && elapsed <= 3.0, "elapsed {}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resumes_from_seed() {
        let (timer, _, _) = timer(10.0, 9.5);
        timer.play();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(timer.state(), TimerState::Stopped);
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_keeps_state() {
        let (timer, _, _) = timer(30.0, 12.0);
        timer.play();
        timer.reset();
        assert_eq!(timer.current_time(), 0.0);
        assert_eq!(timer.state(), TimerState::Playing);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(timer.current_time() > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_terminal_and_silent() {
        let (timer, bus, _) = timer(10.0, 0.0);
        let mut rx = bus.subscribe();

        timer.play();
        tokio::time::sleep(Duration::from_secs(1)).await;
        timer.stop();
        drain(&mut rx);

        timer.play();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(timer.state(), TimerState::Stopped);
        assert!(!timer.is_finished());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_joins_task() {
        let (timer, bus, session) = timer(10.0, 0.0);
        let mut rx = bus.subscribe();

        timer.play();
        tokio::time::sleep(Duration::from_secs(1)).await;
        timer.shutdown().await;

        drain(&mut rx);
        session.store(SessionKey::TimerElapsed, 0.0).await.unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(session.load(SessionKey::TimerElapsed).await.unwrap(), Some(0.0));
    }

    #[test]
    fn test_seconds_conversion() {
        assert_eq!(seconds(1.5), Duration::from_millis(1500));
        assert_eq!(seconds(-3.0), Duration::ZERO);
        assert_eq!(seconds(f64::NAN), Duration::ZERO);
    }
}
