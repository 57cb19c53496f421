use log::{debug, trace};
use matchbook_core::{
    DEFAULT_MATCH_DESCRIPTION, MatchOutcome, MatchRecord, Order, Position, Quantity, SortedBook,
    Timestamp,
};
use matchbook_ports::{MatchingAlgorithm, MatchingError, MatchingResult};

/// Continuous double auction with price-time priority
///
/// Orders are matched based on:
/// 1. Best price (highest bid, lowest ask)
/// 2. Time priority (first in, first out at same price)
///
/// Trades print at `min(long price, short price)`. The pass stops as soon as
/// the best remaining bid is below the best remaining ask.
pub struct ContinuousDoubleAuction {
    description: String,
}

impl ContinuousDoubleAuction {
    pub fn new() -> Self {
        Self {
            description: DEFAULT_MATCH_DESCRIPTION.to_string(),
        }
    }

    /// Use a custom description on every emitted record
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Reject books the walk below cannot handle correctly
    fn validate(&self, book: &SortedBook) -> MatchingResult<()> {
        let sides = [(Position::Long, &book.longs), (Position::Short, &book.shorts)];

        for (expected, orders) in sides {
            for order in orders {
                if order.security_id != book.security_id {
                    return Err(MatchingError::MixedBook {
                        security_id: book.security_id,
                        order_id: order.id,
                        detail: format!("order belongs to security {}", order.security_id),
                    });
                }
                if order.position != expected {
                    return Err(MatchingError::MixedBook {
                        security_id: book.security_id,
                        order_id: order.id,
                        detail: format!("{:?} order on the {:?} side", order.position, expected),
                    });
                }
                if !order.is_consistent() {
                    return Err(MatchingError::InvariantViolation {
                        order_id: order.id,
                        detail: format!(
                            "unmatched {} exceeds quantity {}",
                            order.unmatched, order.quantity
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Default for ContinuousDoubleAuction {
    fn default() -> Self {
        Self::new()
    }
}

/// Subtract a fill from a remaining quantity, refusing to go negative
fn take(order: &Order, remaining: Quantity, fill: Quantity) -> MatchingResult<Quantity> {
    remaining
        .checked_sub(fill)
        .ok_or_else(|| MatchingError::InvariantViolation {
            order_id: order.id,
            detail: format!("fill {} exceeds remaining {}", fill, remaining),
        })
}

impl MatchingAlgorithm for ContinuousDoubleAuction {
    fn name(&self) -> &str {
        "Continuous Double Auction"
    }

    fn match_book(&self, book: SortedBook, now: Timestamp) -> MatchingResult<MatchOutcome> {
        self.validate(&book)?;

        let SortedBook {
            security_id,
            longs,
            mut shorts,
        } = book;
        let mut outcome = MatchOutcome::empty(security_id);
        let mut i = 0;

        'longs: for lo in &longs {
            if lo.is_fully_matched() {
                continue;
            }
            let mut lo_remaining = lo.unmatched;

            while lo_remaining > 0 && i < shorts.len() {
                let so = &mut shorts[i];
                if so.is_fully_matched() {
                    i += 1;
                    continue;
                }

                // Asks only get dearer and bids only get cheaper from here
                if lo.price < so.price {
                    trace!(
                        "security {}: best bid {} below best ask {}, stopping",
                        security_id, lo.price, so.price
                    );
                    break 'longs;
                }

                let quantity = lo_remaining.min(so.unmatched);
                let price = lo.price.min(so.price);

                lo_remaining = take(lo, lo_remaining, quantity)?;
                so.unmatched = take(so, so.unmatched, quantity)?;
                let so_remaining = so.unmatched;

                outcome.trades.push(
                    MatchRecord::new_with_time(lo.id, so.id, security_id, price, quantity, now)
                        .with_description(self.description.as_str()),
                );
                outcome.dirty.record(lo, lo_remaining);
                outcome.dirty.record(so, so_remaining);
            }

            if i >= shorts.len() {
                break;
            }
        }

        debug!(
            "security {}: {} trades, {} orders changed",
            security_id,
            outcome.trades.len(),
            outcome.dirty.len()
        );

        Ok(outcome)
    }
}
