//! AI vision adapter.
//!
//! The image classifier is a black-box remote collaborator. This crate owns
//! the integration surface around it:
//! - the [`VisionClassifier`] trait and its HTTP implementation,
//! - the timeout that turns a slow classifier into a retryable infrastructure error,
//! - local policy that can downgrade a remote pass,
//! - the explicit handling of an unconfigured classifier.

pub mod adapter;
pub mod check;
pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod policy;

pub use adapter::VisionAdapter;
pub use check::{AiVisionCheck, Detection, ImageFlags, Provenance};
pub use classifier::{ClassifierResponse, VisionClassifier};
pub use config::{UnconfiguredPolicy, VisionConfig};
pub use error::VisionError;
pub use http::HttpClassifier;
pub use policy::{apply_local_policy, PolicyOverride, PolicyVerdict};

/// Message reported when a classifier response cannot be interpreted.
pub const MALFORMED_RESPONSE_MESSAGE: &str = "failed to process AI verification response";
