//! Matchbook Store
//!
//! Adapters implementing the [`OrderStore`] port:
//!
//! - [`InMemoryOrderStore`]: concurrent map, atomic pass commits, fault
//!   injection for tests
//! - [`SqlOrderStore`]: renders the order/match table statements and hands
//!   them to any [`SqlExecutor`]
//!
//! ## Tables
//!
//! ```text
//! t_order        ID, SECURITY_ID, POSITION (1 long / -1 short), PRICE,
//!                QUANTITY, UNMATCHED, REVISION, CREATE_TIME, UPDATE_TIME
//! t_match_order  LONG_ORDER_ID, SHORT_ORDER_ID, SECURITY_ID, PRICE,
//!                QUANTITY, CREATE_TIME, UPDATE_TIME, DESCRIPTION
//! ```

pub mod memory;
pub mod sql;

pub use memory::InMemoryOrderStore;
pub use sql::{Row, SqlExecutor, SqlOrderStore, Statement, statements};

// Re-export the port for convenience
pub use matchbook_ports::{OrderStore, StoreError, StoreResult};
