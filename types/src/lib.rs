//! Fundamental types for the quest verification engine.
//!
//! This crate defines the data model shared across every other crate in the
//! workspace: identifiers, timestamps, geo points, quest requirements,
//! submission evidence, unlock conditions, layer identifiers and failure codes.

pub mod evidence;
pub mod failure;
pub mod geo;
pub mod ids;
pub mod layer;
pub mod requirement;
pub mod time;
pub mod unlock;

pub use evidence::{Coordinates, DeviceTelemetry, ImagePayload, SubmissionEvidence};
pub use failure::FailureCode;
pub use geo::{GeoPoint, GeoTarget};
pub use ids::{AttemptId, ChapterId, QuestId, UserId};
pub use layer::LayerKind;
pub use requirement::{
    AiRequirements, CompletionLimits, DateWindow, QuestRequirement, TimeWindowConfig,
};
pub use time::{Clock, SystemClock, Timestamp};
pub use unlock::{UnlockCondition, UnlockMethod, UnlockPayload, UnlockRecord};
