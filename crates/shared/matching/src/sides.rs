use std::cmp::Ordering;

use matchbook_core::{Order, SecurityId, SortedBook};

/// Best bid first: price descending, then earlier orders first
fn long_priority(a: &Order, b: &Order) -> Ordering {
    b.price
        .cmp(&a.price)
        .then_with(|| a.create_time.cmp(&b.create_time))
        .then_with(|| a.id.cmp(&b.id))
}

/// Best ask first: price ascending, then earlier orders first
fn short_priority(a: &Order, b: &Order) -> Ordering {
    a.price
        .cmp(&b.price)
        .then_with(|| a.create_time.cmp(&b.create_time))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort bids by price-time priority in place
pub fn sort_longs(longs: &mut [Order]) {
    longs.sort_by(long_priority);
}

/// Sort asks by price-time priority in place
pub fn sort_shorts(shorts: &mut [Order]) {
    shorts.sort_by(short_priority);
}

/// Partition a flat order set into sorted long and short sides
///
/// Never fails. An empty side simply yields a book that cannot trade.
/// Order id is the last tiebreak so equal price and time still sort the
/// same way on every run.
pub fn split_sides(
    security_id: SecurityId,
    orders: impl IntoIterator<Item = Order>,
) -> SortedBook {
    let (mut longs, mut shorts): (Vec<Order>, Vec<Order>) =
        orders.into_iter().partition(Order::is_long);

    sort_longs(&mut longs);
    sort_shorts(&mut shorts);

    SortedBook {
        security_id,
        longs,
        shorts,
    }
}
