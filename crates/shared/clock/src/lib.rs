//! Matchbook Clock Infrastructure
//!
//! Time sources for stamping match records and update times:
//!
//! - [`SystemClock`]: wall-clock time for production
//! - [`FixedClock`]: frozen time that tests move by hand
//!
//! ## Usage
//!
//! ```ignore
//! use matchbook_clock::{Clock, FixedClock};
//! use chrono::Duration;
//!
//! let clock = FixedClock::at_epoch();
//! let t0 = clock.now();
//! clock.advance(Duration::seconds(1));
//! assert!(clock.now() > t0);
//! ```

mod fixed;
mod system;

pub use fixed::FixedClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use matchbook_ports::Clock;
