//! Abstract storage for quest completion counters.
//!
//! The engine reads counters during admission control and writes them only
//! through [`CompletionStore::try_claim`], which every backend must implement
//! as one atomic check-then-increment (a single critical section, a
//! conditional update, or a transaction with optimistic concurrency).

pub mod admission;
pub mod completion;
pub mod error;
pub mod memory;

pub use admission::{check_limits, AdmissionDenial};
pub use completion::{ClaimOutcome, CompletionClaim, CompletionStore, QuestCounters, UserCounters};
pub use error::StoreError;
pub use memory::MemoryCompletionStore;
