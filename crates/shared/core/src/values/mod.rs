use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal so integral and fixed-point prices compare exactly
pub type Price = Decimal;

/// Quantity value - whole lots, never negative
pub type Quantity = u64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Identifies the instrument an order is resting on.
/// Also the partition key for dispatch.
pub type SecurityId = u32;

/// Per-order counter bumped by every persisted update
pub type Revision = u64;
