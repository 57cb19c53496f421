//! Matchbook Matching
//!
//! Turns the unmatched orders of one security into match records:
//!
//! 1. [`split_sides`] partitions the orders into longs and shorts and sorts
//!    each side by price-time priority.
//! 2. [`ContinuousDoubleAuction`] walks both sides and crosses them.
//!
//! Both steps are pure and safe to test without a store.

mod price_time;
mod sides;

pub use price_time::ContinuousDoubleAuction;
pub use sides::{split_sides, sort_longs, sort_shorts};

// Re-export the trait from ports for convenience
pub use matchbook_ports::{MatchingAlgorithm, MatchingError, MatchingResult};
