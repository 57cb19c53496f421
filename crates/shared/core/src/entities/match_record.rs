use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderId;
use crate::values::{Price, Quantity, SecurityId};

/// Unique identifier for a match record
pub type MatchId = Uuid;

/// Default description attached to records produced by the matcher
pub const DEFAULT_MATCH_DESCRIPTION: &str = "continuous match";

/// Trade resulting from crossing a long order with a short order
///
/// Write-once: created by the matching algorithm and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub long_order_id: OrderId,
    pub short_order_id: OrderId,
    pub security_id: SecurityId,
    /// Always `min(long price, short price)`
    pub price: Price,
    /// Always > 0
    pub quantity: Quantity,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub description: String,
}

impl MatchRecord {
    /// Create a new match record with explicit timestamp
    pub fn new_with_time(
        long_order_id: OrderId,
        short_order_id: OrderId,
        security_id: SecurityId,
        price: Price,
        quantity: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            long_order_id,
            short_order_id,
            security_id,
            price,
            quantity,
            create_time: timestamp,
            update_time: timestamp,
            description: DEFAULT_MATCH_DESCRIPTION.to_string(),
        }
    }

    /// Replace the description (builder style)
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns true if the record touches the given order on either side
    pub fn involves(&self, order_id: OrderId) -> bool {
        self.long_order_id == order_id || self.short_order_id == order_id
    }
}
