//! Matchbook Ports
//!
//! Port definitions (traits) for the continuous order matcher.
//! These define the boundaries between domain logic and infrastructure.

mod clock;
mod error;
mod matching;
mod store;

pub use clock::Clock;
pub use error::{MatchingError, MatchingResult, StoreError, StoreResult};
pub use matching::MatchingAlgorithm;
pub use store::OrderStore;
