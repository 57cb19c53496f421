use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Position;
use crate::values::{Price, Quantity, Revision, SecurityId};

/// Unique identifier for an order
pub type OrderId = u64;

/// A resting order as read from the order store
///
/// The matcher only reads `position`, `price` and `unmatched`, and writes
/// back `unmatched`. Everything else is owned by order entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Instrument the order rests on
    pub security_id: SecurityId,
    pub position: Position,
    pub price: Price,
    /// Original quantity
    pub quantity: Quantity,
    /// Remaining tradable quantity, `0 <= unmatched <= quantity`
    pub unmatched: Quantity,
    /// Optimistic counter bumped on every persisted update
    pub revision: Revision,
    /// Time-priority tiebreak
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Order {
    /// Create a fresh, fully unmatched order with explicit timestamp
    pub fn new_with_time(
        id: OrderId,
        security_id: SecurityId,
        position: Position,
        price: Price,
        quantity: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            security_id,
            position,
            price,
            quantity,
            unmatched: quantity,
            revision: 0,
            create_time: timestamp,
            update_time: timestamp,
        }
    }

    /// Create a fresh order using current system time
    /// Note: tests that depend on time priority should use `new_with_time`
    pub fn new(
        id: OrderId,
        security_id: SecurityId,
        position: Position,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self::new_with_time(id, security_id, position, price, quantity, Utc::now())
    }

    /// Override the remaining quantity (builder style)
    pub fn with_unmatched(mut self, unmatched: Quantity) -> Self {
        self.unmatched = unmatched;
        self
    }

    pub fn is_long(&self) -> bool {
        self.position == Position::Long
    }

    pub fn is_short(&self) -> bool {
        self.position == Position::Short
    }

    /// Returns true once nothing is left to trade
    pub fn is_fully_matched(&self) -> bool {
        self.unmatched == 0
    }

    /// Checks `unmatched <= quantity`
    pub fn is_consistent(&self) -> bool {
        self.unmatched <= self.quantity
    }
}
