//! # Lectio Common Library
//!
//! Shared code for the Lectio reader services:
//! - Scripture addressing (chapter addresses, verse ranges, passages)
//! - Reader behaviors and repeat policies
//! - Event types (ReaderEvent enum) and the EventBus
//! - Configuration loading
//! - Database bootstrap
//! - Timestamp helpers

pub mod behavior;
pub mod bible;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use behavior::{ReaderBehavior, RepeatPolicy};
pub use bible::{BookView, ChapterAddress, Passage, VerseRange};
pub use error::{Error, Result};
