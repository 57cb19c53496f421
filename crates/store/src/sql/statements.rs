//! SQL text for the order and match tables
//!
//! Batch writes are always a single statement: one multi-row INSERT for match
//! records and one `UPDATE ... CASE` for remaining quantities.

use matchbook_core::{DirtySet, MatchRecord, SecurityId, Timestamp};

pub const ORDER_TABLE: &str = "t_order";
pub const MATCH_TABLE: &str = "t_match_order";

const MATCH_COLUMNS: &str =
    "LONG_ORDER_ID, SHORT_ORDER_ID, SECURITY_ID, PRICE, QUANTITY, CREATE_TIME, UPDATE_TIME, DESCRIPTION";

/// Render a timestamp the way the order tables store it
pub fn sql_timestamp(time: Timestamp) -> String {
    format!("'{}'", time.format("%Y-%m-%d %H:%M:%S%.3f"))
}

/// Quote a text literal, doubling embedded quotes
pub fn sql_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

pub fn open_securities_query() -> String {
    format!("SELECT DISTINCT SECURITY_ID FROM {ORDER_TABLE} WHERE UNMATCHED != 0")
}

pub fn unmatched_orders_query(security_id: SecurityId) -> String {
    format!("SELECT * FROM {ORDER_TABLE} WHERE SECURITY_ID = {security_id} AND UNMATCHED != 0")
}

/// Multi-row insert of match records, `None` when there is nothing to insert
pub fn insert_match_records(records: &[MatchRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let rows: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "({}, {}, {}, {}, {}, {}, {}, {})",
                r.long_order_id,
                r.short_order_id,
                r.security_id,
                r.price,
                r.quantity,
                sql_timestamp(r.create_time),
                sql_timestamp(r.update_time),
                sql_text(&r.description)
            )
        })
        .collect();

    Some(format!(
        "INSERT INTO {MATCH_TABLE} ({MATCH_COLUMNS}) VALUES {}",
        rows.join(", ")
    ))
}

/// Single conditional update of remaining quantities keyed by order id
///
/// Only rows still at the revision the pass read are touched; each gets
/// `REVISION + 1` and the given update time. The statement affects exactly
/// `updates.len()` rows when nothing is stale. `None` when the dirty set is
/// empty.
pub fn update_unmatched(updates: &DirtySet, now: Timestamp) -> Option<String> {
    if updates.is_empty() {
        return None;
    }

    let quantities: Vec<String> = updates
        .entries()
        .map(|(id, e)| format!("WHEN {id} THEN {}", e.unmatched))
        .collect();
    let revisions: Vec<String> = updates
        .entries()
        .map(|(id, e)| format!("WHEN {id} THEN {}", e.revision))
        .collect();
    let ids: Vec<String> = updates.order_ids().map(|id| id.to_string()).collect();

    Some(format!(
        "UPDATE {ORDER_TABLE} SET UNMATCHED = CASE ID {} END, REVISION = REVISION + 1, UPDATE_TIME = {} \
         WHERE ID IN ({}) AND REVISION = CASE ID {} END",
        quantities.join(" "),
        sql_timestamp(now),
        ids.join(", "),
        revisions.join(" ")
    ))
}
