use chrono::{DateTime, Duration, Utc};
use matchbook_core::Timestamp;
use matchbook_ports::Clock;
use parking_lot::RwLock;

/// Frozen clock for deterministic tests
///
/// Time only moves when `advance` or `set` is called.
pub struct FixedClock {
    current: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(time),
        }
    }

    /// Clock frozen at the Unix epoch
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Jump forward (or backward, with a negative duration)
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write();
        *current += duration;
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.current.write() = time;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at_epoch()
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }

    fn name(&self) -> &str {
        "FixedClock"
    }
}
