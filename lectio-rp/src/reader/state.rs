//! Reader orchestrator
//!
//! [`PlayerBehaviorState`] ties the active behavior, the persisted sequence
//! index and the optional playback timer together. Every mutation runs under
//! one async lock so a behavior change fully tears down the previous timer
//! before anything else can observe or replace it.

use std::sync::Arc;
use std::time::Duration;

use lectio_common::events::{EventBus, ReaderEvent, TimerState};
use lectio_common::{time, Error, Passage, ReaderBehavior, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::queue::{Queue, QueueWindow};
use super::resolver::{resolve, Resolution};
use super::timer::{PlaybackTimer, TimerStatus};
use crate::db::{BehaviorStore, SessionKey, SessionStore};
use crate::providers::ReaderContext;

/// Largest accepted queue radius
pub const MAX_QUEUE_RADIUS: u32 = 100;

struct Inner {
    index: u32,
    timer: Option<PlaybackTimer>,
}

/// Collaborators and tuning for a [`PlayerBehaviorState`]
#[derive(Clone)]
pub struct ReaderDeps {
    pub context: ReaderContext,
    pub behaviors: Arc<dyn BehaviorStore>,
    pub session: Arc<dyn SessionStore>,
    pub events: EventBus,
    pub tick_interval: Duration,
}

/// Reader state machine
pub struct PlayerBehaviorState {
    deps: ReaderDeps,
    inner: Mutex<Inner>,
}

impl PlayerBehaviorState {
    /// Restore the reader from persisted state
    ///
    /// The sequence index is reloaded; a timed behavior gets a paused timer
    /// resuming from the persisted elapsed time. A timer that had already
    /// finished is restored finished, so the ended sequence stays ended.
    pub async fn load(deps: ReaderDeps) -> Result<Self> {
        let index = deps
            .session
            .load(SessionKey::SequenceIndex)
            .await?
            .map(index_from_stored)
            .unwrap_or(0);

        let state = Self {
            deps,
            inner: Mutex::new(Inner { index, timer: None }),
        };

        let behavior = state.get_behavior().await?;
        {
            let mut inner = state.inner.lock().await;
            let duration = match state.timer_duration(&behavior).await {
                Ok(duration) => duration,
                Err(e) => {
                    warn!("Not restoring timer, {} behavior does not resolve: {}", behavior.kind(), e);
                    None
                }
            };
            if let Some(duration) = duration {
                let stored = state.stored_elapsed().await?;
                let timer = state.new_timer(duration, stored);
                if timer.is_finished() {
                    timer.stop();
                }
                inner.timer = Some(timer);
            }
        }

        info!(
            "Reader loaded: {} behavior at index {}",
            behavior.kind(),
            index
        );
        Ok(state)
    }

    pub fn events(&self) -> &EventBus {
        &self.deps.events
    }

    // ========================================================================
    // Behavior
    // ========================================================================

    /// Make `behavior` active: index back to 0, timer discarded and, for a
    /// timed policy with something to play, replaced by a fresh paused one
    pub async fn set_behavior(&self, behavior: ReaderBehavior) -> Result<()> {
        behavior.validate()?;
        let timer_duration = self.timer_duration(&behavior).await?;

        let mut inner = self.inner.lock().await;

        inner.index = 0;
        self.persist_index(0).await?;

        if let Some(timer) = inner.timer.take() {
            timer.shutdown().await;
        }
        self.deps.session.store(SessionKey::TimerElapsed, 0.0).await?;

        self.deps.behaviors.set_reader_behavior(&behavior).await?;

        if let Some(duration) = timer_duration {
            inner.timer = Some(self.new_timer(duration, 0.0));
        }

        info!("Reader behavior set: {}", behavior.kind());
        self.deps.events.emit_lossy(ReaderEvent::BehaviorChanged {
            behavior,
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Active behavior, read from the behavior store
    pub async fn get_behavior(&self) -> Result<ReaderBehavior> {
        self.deps.behaviors.get_reader_behavior().await
    }

    // ========================================================================
    // Timer lifecycle
    // ========================================================================

    /// Replace any timer with one resuming from the persisted elapsed time
    ///
    /// No-op (beyond discarding the old timer) when the policy is not timed
    /// or the behavior has nothing to play.
    pub async fn start_timer(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.start_timer_locked(&mut inner).await
    }

    async fn start_timer_locked(&self, inner: &mut Inner) -> Result<()> {
        if let Some(timer) = inner.timer.take() {
            timer.shutdown().await;
        }

        let behavior = self.get_behavior().await?;
        let Some(duration) = self.timer_duration(&behavior).await? else {
            debug!("start_timer ignored: {} behavior has no timed content", behavior.kind());
            return Ok(());
        };

        let elapsed = self.resume_point(duration).await?;
        inner.timer = Some(self.new_timer(duration, elapsed));

        self.deps.events.emit_lossy(ReaderEvent::TimerStarted {
            duration,
            elapsed,
            timestamp: time::now(),
        });
        Ok(())
    }

    /// Stop and discard the timer
    pub async fn stop_timer(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(timer) = inner.timer.take() {
            let elapsed = timer.current_time();
            timer.shutdown().await;
            debug!("Timer stopped at {:.3}s", elapsed);
            self.deps.events.emit_lossy(ReaderEvent::TimerStopped {
                finished: false,
                elapsed,
                timestamp: time::now(),
            });
        }
    }

    pub async fn pause_timer(&self) {
        if let Some(timer) = self.inner.lock().await.timer.as_ref() {
            timer.pause();
        }
    }

    pub async fn play_timer(&self) {
        if let Some(timer) = self.inner.lock().await.timer.as_ref() {
            timer.play();
        }
    }

    /// Play, first starting a new timer if there is none or it has finished
    pub async fn resume_or_restart(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let needs_new = inner.timer.as_ref().map_or(true, |t| t.is_finished());
        if needs_new {
            self.start_timer_locked(&mut inner).await?;
        }
        if let Some(timer) = inner.timer.as_ref() {
            timer.play();
        }
        Ok(())
    }

    /// Zero the timer's elapsed time, creating a timer if none is live
    pub async fn restart(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.deps.session.store(SessionKey::TimerElapsed, 0.0).await?;

        let live = inner
            .timer
            .as_ref()
            .is_some_and(|t| t.state() != TimerState::Stopped);
        if !live {
            return self.start_timer_locked(&mut inner).await;
        }
        if let Some(timer) = inner.timer.as_ref() {
            timer.reset();
        }
        Ok(())
    }

    pub async fn timer_status(&self) -> Option<TimerStatus> {
        self.inner.lock().await.timer.as_ref().map(|t| t.status())
    }

    // ========================================================================
    // Sequence index
    // ========================================================================

    pub async fn current_index(&self) -> u32 {
        self.inner.lock().await.index
    }

    pub async fn set_index(&self, index: u32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.update_index(&mut inner, index).await
    }

    /// Move to the next position; returns the new index
    pub async fn advance(&self) -> Result<u32> {
        let mut inner = self.inner.lock().await;
        let next = inner.index.saturating_add(1);
        self.update_index(&mut inner, next).await?;
        Ok(next)
    }

    pub async fn reset_index(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.update_index(&mut inner, 0).await
    }

    async fn update_index(&self, inner: &mut Inner, index: u32) -> Result<()> {
        inner.index = index;
        self.persist_index(index).await?;
        debug!("Sequence index -> {}", index);
        self.deps.events.emit_lossy(ReaderEvent::SequenceIndexChanged {
            index,
            timestamp: time::now(),
        });
        Ok(())
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Passage at `index` (default: the current index)
    ///
    /// `None` once the timer has finished or the behavior is exhausted.
    pub async fn get_section(&self, index: Option<u32>) -> Result<Option<Passage>> {
        let (current, finished) = self.snapshot().await;
        if finished {
            return Ok(None);
        }

        let behavior = self.get_behavior().await?;
        let resolution = resolve(&behavior, index.unwrap_or(current), &self.deps.context).await?;
        Ok(resolution.passage())
    }

    /// Passages within `radius` of the current index
    ///
    /// `radius` above [`MAX_QUEUE_RADIUS`] is rejected.
    pub async fn get_queue(&self, radius: u32) -> Result<Queue> {
        if radius > MAX_QUEUE_RADIUS {
            return Err(Error::InvalidInput(format!(
                "queue radius must be at most {}, got {}",
                MAX_QUEUE_RADIUS, radius
            )));
        }

        let (current, finished) = self.snapshot().await;
        let window = QueueWindow::around(current, radius);

        let mut slots = Vec::new();
        if !finished {
            let behavior = self.get_behavior().await?;
            for index in window.indices() {
                let passage = resolve(&behavior, index, &self.deps.context).await?.passage();
                // Exhaustion only grows with the index
                if passage.is_none() {
                    break;
                }
                slots.push(passage);
            }
        }

        Ok(Queue::from_slots(&window, slots))
    }

    /// Stop the timer task; used before dropping the reader
    pub async fn shutdown(&self) {
        if let Some(timer) = self.inner.lock().await.timer.take() {
            timer.shutdown().await;
        }
    }

    async fn snapshot(&self) -> (u32, bool) {
        let inner = self.inner.lock().await;
        let finished = inner.timer.as_ref().is_some_and(|t| t.is_finished());
        (inner.index, finished)
    }

    /// Persisted elapsed time; 0 when unset or not a usable number
    async fn stored_elapsed(&self) -> Result<f64> {
        let stored = self
            .deps
            .session
            .load(SessionKey::TimerElapsed)
            .await?
            .unwrap_or(0.0);
        Ok(if stored.is_finite() && stored > 0.0 { stored } else { 0.0 })
    }

    /// Persisted elapsed time, or 0 if it already reached `duration`
    async fn resume_point(&self, duration: f64) -> Result<f64> {
        let stored = self.stored_elapsed().await?;
        Ok(if stored < duration { stored } else { 0.0 })
    }

    /// Timer duration for `behavior`: timed policies whose first position
    /// resolves to a passage
    async fn timer_duration(&self, behavior: &ReaderBehavior) -> Result<Option<f64>> {
        if !behavior.policy().is_timed() {
            return Ok(None);
        }
        match resolve(behavior, 0, &self.deps.context).await? {
            Resolution::Passage(_) => Ok(behavior.duration()),
            Resolution::Exhausted => Ok(None),
        }
    }

    fn new_timer(&self, duration: f64, elapsed: f64) -> PlaybackTimer {
        PlaybackTimer::start(
            duration,
            elapsed,
            self.deps.tick_interval,
            self.deps.events.clone(),
            self.deps.session.clone(),
        )
    }

    async fn persist_index(&self, index: u32) -> Result<()> {
        self.deps
            .session
            .store(SessionKey::SequenceIndex, index as f64)
            .await
    }
}

fn index_from_stored(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.min(u32::MAX as f64) as u32
    } else {
        0
    }
}
