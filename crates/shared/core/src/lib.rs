//! Matchbook Core Domain
//!
//! Pure domain types for the continuous order matcher.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod book;
pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use book::{MatchOutcome, SortedBook};
pub use entities::{
    DEFAULT_MATCH_DESCRIPTION, DirtyEntry, DirtySet, MatchId, MatchRecord, Order, OrderId, Position,
};
pub use values::{Price, Quantity, Revision, SecurityId, Timestamp};
