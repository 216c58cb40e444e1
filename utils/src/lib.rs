//! Shared utilities for the quest verification engine.

pub mod distance;
pub mod time;

pub use distance::format_distance;
pub use time::format_duration_ms;
