//! Database access layer
//!
//! Persistence ports used by the reader: the behavior store (settings table)
//! and the per-scope session store (sequence index, timer elapsed time).

pub mod session;
pub mod settings;

pub use session::{MemorySessionStore, SessionKey, SessionStore, SqliteSessionStore};
pub use settings::{BehaviorStore, MemoryBehaviorStore, SqliteBehaviorStore};
