use matchbook_core::{MatchOutcome, SortedBook, Timestamp};

use crate::error::MatchingResult;

/// Port for order matching algorithms
///
/// Implementations must be pure: no I/O, no shared state. The book is a
/// pass-local copy and `now` stamps every record the pass emits.
pub trait MatchingAlgorithm: Send + Sync {
    /// Cross the two sides of the book and return the trades plus changed orders
    fn match_book(&self, book: SortedBook, now: Timestamp) -> MatchingResult<MatchOutcome>;

    /// Get the name of the algorithm
    fn name(&self) -> &str;
}
