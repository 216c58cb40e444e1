//! Quest engine.
//!
//! Wires the verification crates into the two entry points the surrounding
//! system calls:
//! - [`CompletionService`]: admission control, layered verification, the
//!   attempt state machine and the atomic completion claim.
//! - [`StoryService`]: chapter unlocks with an append-only history.
//!
//! Plus the ambient pieces every deployment needs: TOML configuration,
//! structured logging, Prometheus metrics and tracing spans.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod service;
pub mod story;
pub mod tracing_spans;

pub use config::EngineConfig;
pub use error::EngineError;
pub use logging::{init_logging, LogFormat};
pub use metrics::EngineMetrics;
pub use service::{quest_day, CompletionService};
pub use story::{Story, StoryService};
