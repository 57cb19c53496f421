use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Order, OrderId};
use crate::values::{Quantity, Revision};

/// New remaining quantity of one order, guarded by the revision it was read at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyEntry {
    pub unmatched: Quantity,
    /// Revision of the snapshot the pass matched against
    pub revision: Revision,
}

/// Orders whose remaining quantity changed during one matching pass
///
/// Maps order id to the new `unmatched` value and the revision the pass read.
/// Stores apply the set only if every order is still at that revision, so a
/// pass working from a stale snapshot is rejected as a whole. Scoped to a
/// single pass and never shared between partitions. Ordered so batch
/// statements render the same way every time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtySet {
    entries: BTreeMap<OrderId, DirtyEntry>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest remaining quantity of an order, replacing any earlier value
    pub fn record(&mut self, order: &Order, unmatched: Quantity) {
        self.entries.insert(
            order.id,
            DirtyEntry {
                unmatched,
                revision: order.revision,
            },
        );
    }

    pub fn get(&self, order_id: OrderId) -> Option<Quantity> {
        self.entries.get(&order_id).map(|e| e.unmatched)
    }

    /// Revision the order must still be at for the update to apply
    pub fn expected_revision(&self, order_id: OrderId) -> Option<Revision> {
        self.entries.get(&order_id).map(|e| e.revision)
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.entries.contains_key(&order_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(order_id, new_unmatched)` in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (OrderId, Quantity)> + '_ {
        self.entries.iter().map(|(id, e)| (*id, e.unmatched))
    }

    /// Iterate `(order_id, entry)` in ascending id order
    pub fn entries(&self) -> impl Iterator<Item = (OrderId, DirtyEntry)> + '_ {
        self.entries.iter().map(|(id, e)| (*id, *e))
    }

    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.entries.keys().copied()
    }
}

/// Collects `(order_id, new_unmatched, read_revision)`
impl FromIterator<(OrderId, Quantity, Revision)> for DirtySet {
    fn from_iter<I: IntoIterator<Item = (OrderId, Quantity, Revision)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(id, unmatched, revision)| (id, DirtyEntry { unmatched, revision }))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;
    use rust_decimal_macros::dec;

    fn order(id: OrderId, revision: Revision) -> Order {
        let mut order = Order::new(id, 1, Position::Long, dec!(100), 5);
        order.revision = revision;
        order
    }

    #[test]
    fn test_record_keeps_latest_value() {
        let mut dirty = DirtySet::new();
        dirty.record(&order(9, 2), 4);
        dirty.record(&order(3, 0), 1);
        dirty.record(&order(9, 2), 0);

        assert_eq!(dirty.len(), 2);
        assert_eq!(dirty.get(9), Some(0));
        assert_eq!(dirty.iter().collect::<Vec<_>>(), vec![(3, 1), (9, 0)]);
    }

    #[test]
    fn test_record_captures_read_revision() {
        let mut dirty = DirtySet::new();
        dirty.record(&order(4, 7), 2);

        assert_eq!(dirty.expected_revision(4), Some(7));
        assert_eq!(
            dirty.entries().collect::<Vec<_>>(),
            vec![(4, DirtyEntry { unmatched: 2, revision: 7 })]
        );
    }

    #[test]
    fn test_empty() {
        let dirty = DirtySet::new();
        assert!(dirty.is_empty());
        assert!(!dirty.contains(1));
        assert_eq!(dirty.expected_revision(1), None);
    }
}
