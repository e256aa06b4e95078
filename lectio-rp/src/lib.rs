//! # Lectio Reader Player Library (lectio-rp)
//!
//! Continuous reading engine: decides which passage is active at each
//! position of an open-ended reading sequence, windows that sequence for
//! display, and runs a resumable playback timer.
//!
//! **Architecture:** providers (bible structure, reading plan, current
//! passage) feed a stateless resolver; [`reader::PlayerBehaviorState`]
//! orchestrates it with persisted session state and exposes everything over
//! an HTTP/SSE control API.

pub mod api;
pub mod config;
pub mod db;
pub mod providers;
pub mod reader;

pub use lectio_common::{Error, Result};
pub use reader::PlayerBehaviorState;
