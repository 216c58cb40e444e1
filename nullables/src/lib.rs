//! Nullable infrastructure for deterministic testing.
//!
//! Every impure collaborator of the engine (clock, completion store, image
//! classifier) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod classifier;
pub mod clock;
pub mod store;

pub use classifier::NullClassifier;
pub use clock::NullClock;
pub use store::NullCompletionStore;
