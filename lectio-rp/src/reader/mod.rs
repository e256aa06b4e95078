//! Continuous reading core
//!
//! - [`resolver`]: sequence position to passage
//! - [`queue`]: look-behind/look-ahead window math
//! - [`timer`]: drift-corrected playback timer
//! - [`state`]: the orchestrator tying them to persisted state

pub mod queue;
pub mod resolver;
pub mod state;
pub mod timer;

pub use queue::{Queue, QueueWindow};
pub use resolver::{resolve, Resolution};
pub use state::{PlayerBehaviorState, ReaderDeps, MAX_QUEUE_RADIUS};
pub use timer::{PlaybackTimer, TimerStatus};
