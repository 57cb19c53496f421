//! Inputs and outputs of a single matching pass

use serde::{Deserialize, Serialize};

use crate::entities::{DirtySet, MatchRecord, Order};
use crate::values::{Quantity, SecurityId};

/// Unmatched orders of one security, split by side and sorted by price-time priority
///
/// The orders are pass-local copies: the matcher may decrement their
/// `unmatched` freely without touching the persisted rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedBook {
    pub security_id: SecurityId,
    /// Bids, best (highest) price first, earlier orders first at equal price
    pub longs: Vec<Order>,
    /// Asks, best (lowest) price first, earlier orders first at equal price
    pub shorts: Vec<Order>,
}

impl SortedBook {
    /// A pass can only produce trades when both sides have orders
    pub fn is_two_sided(&self) -> bool {
        !self.longs.is_empty() && !self.shorts.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.longs.len() + self.shorts.len()
    }
}

/// Result of one matching pass, pending persistence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub security_id: SecurityId,
    pub trades: Vec<MatchRecord>,
    pub dirty: DirtySet,
}

impl MatchOutcome {
    pub fn empty(security_id: SecurityId) -> Self {
        Self {
            security_id,
            trades: Vec::new(),
            dirty: DirtySet::new(),
        }
    }

    /// Nothing to persist
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.dirty.is_empty()
    }

    /// Total quantity traded in the pass
    pub fn traded_quantity(&self) -> Quantity {
        self.trades.iter().map(|t| t.quantity).sum()
    }
}
