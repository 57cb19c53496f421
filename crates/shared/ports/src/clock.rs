use matchbook_core::Timestamp;

/// Source of the time stamped on match records and order updates
///
/// One reading is taken per matching pass, so every record and update of
/// that pass carries the same instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    fn name(&self) -> &str {
        "Clock"
    }
}
