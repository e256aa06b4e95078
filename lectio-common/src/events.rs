//! Event types for the Lectio event system
//!
//! Provides the shared [`ReaderEvent`] definitions and the [`EventBus`] that
//! carries them from the reader state and its playback timer to listeners
//! (SSE clients, auto-advance consumers, tests).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::behavior::ReaderBehavior;

/// Playback timer state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Playing,
    Paused,
    /// Terminal: a stopped timer is replaced, never restarted
    Stopped,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerState::Playing => write!(f, "playing"),
            TimerState::Paused => write!(f, "paused"),
            TimerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Reader event types
///
/// Events are broadcast via [`EventBus`] and serialized as JSON for SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReaderEvent {
    /// A new behavior became active (sequence index is back at 0)
    BehaviorChanged {
        behavior: ReaderBehavior,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The sequence index moved (advance, jump from the queue display, reset)
    SequenceIndexChanged {
        index: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A playback timer was created for a timed behavior
    TimerStarted {
        /// Target duration in seconds
        duration: f64,
        /// Elapsed seconds the timer resumed from
        elapsed: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Periodic progress while the timer is playing
    TimerTick {
        elapsed: f64,
        duration: f64,
        /// `elapsed / duration`, in `[0, 1)`
        progress: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The timer ended
    TimerStopped {
        /// True when the duration was reached; false when stopped explicitly
        finished: bool,
        elapsed: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ReaderEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            ReaderEvent::BehaviorChanged { .. } => "BehaviorChanged",
            ReaderEvent::SequenceIndexChanged { .. } => "SequenceIndexChanged",
            ReaderEvent::TimerStarted { .. } => "TimerStarted",
            ReaderEvent::TimerTick { .. } => "TimerTick",
            ReaderEvent::TimerStopped { .. } => "TimerStopped",
        }
    }
}

/// Central event distribution bus
///
/// Uses `tokio::sync::broadcast` internally:
/// - Non-blocking publish (slow subscribers don't block the tick task)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use lectio_common::events::{EventBus, ReaderEvent};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(ReaderEvent::SequenceIndexChanged {
///     index: 3,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(ReaderEvent::SequenceIndexChanged { index: 3, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ReaderEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ReaderEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
