//! HTTP API
//!
//! REST control endpoints for the reader plus the SSE event stream.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, run, AppContext};
