use chrono::{DateTime, NaiveDateTime, Utc};
use matchbook_core::{Order, Position, SecurityId};
use matchbook_ports::{StoreError, StoreResult};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::executor::Row;

/// `t_order` row as returned by the executor
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct OrderRow {
    id: u64,
    security_id: SecurityId,
    position: i64,
    price: Decimal,
    quantity: u64,
    unmatched: u64,
    #[serde(default)]
    revision: u64,
    create_time: String,
    #[serde(default)]
    update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct SecurityRow {
    security_id: SecurityId,
}

/// Accepts RFC 3339 or the table's `YYYY-MM-DD HH:MM:SS[.fff]` format (taken as UTC)
fn parse_time(raw: &str) -> StoreResult<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::MalformedRow(format!("bad timestamp '{}': {}", raw, e)))
}

pub(crate) fn order_from_row(row: Row) -> StoreResult<Order> {
    let row: OrderRow = serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| StoreError::MalformedRow(e.to_string()))?;

    let position = Position::from_code(row.position).ok_or_else(|| {
        StoreError::MalformedRow(format!("order {} has position {}", row.id, row.position))
    })?;
    let create_time = parse_time(&row.create_time)?;
    let update_time = match row.update_time.as_deref() {
        Some(raw) => parse_time(raw)?,
        None => create_time,
    };

    Ok(Order {
        id: row.id,
        security_id: row.security_id,
        position,
        price: row.price,
        quantity: row.quantity,
        unmatched: row.unmatched,
        revision: row.revision,
        create_time,
        update_time,
    })
}

pub(crate) fn security_from_row(row: Row) -> StoreResult<SecurityId> {
    serde_json::from_value::<SecurityRow>(serde_json::Value::Object(row))
        .map(|r| r.security_id)
        .map_err(|e| StoreError::MalformedRow(e.to_string()))
}
