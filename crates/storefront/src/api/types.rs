//! Tolerant decoders for shop API response bodies.
//!
//! Mutation and order endpoints answer with ad-hoc JSON whose field names
//! have drifted across API revisions; these decode defensively rather than
//! through strict serde structs, mirroring the cart payload decoder.

use chrono::{DateTime, Utc};
use serde_json::Value;
use spindle_core::{OrderId, Price, RecordId};

use crate::cart::{LineSnapshot, OrderSnapshot};

/// Decode the line body a mutation endpoint returns, if it returned one.
#[must_use]
pub(super) fn decode_line_snapshot(body: &Value) -> Option<LineSnapshot> {
    if !body.is_object() {
        return None;
    }

    let record_id = int_field(body, &["recordId", "idRecord"])?;
    let quantity = int_field(body, &["amount", "quantity"]).unwrap_or(0);

    Some(LineSnapshot {
        record_id: RecordId::new(record_id),
        quantity: u32::try_from(quantity).unwrap_or(0),
        stock: int_field(body, &["stock"]).and_then(|v| u32::try_from(v).ok()),
    })
}

/// Decode an order confirmation body.
#[must_use]
pub(super) fn decode_order_snapshot(body: &Value) -> OrderSnapshot {
    let order_id = int_field(body, &["idOrder", "orderId", "id"]).unwrap_or(0);
    let total = body
        .get("totalAmount")
        .or_else(|| body.get("total"))
        .and_then(Value::as_f64)
        .map_or(Price::ZERO, Price::from_f64_lossy);
    let placed_at = body
        .get("orderDate")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map_or_else(Utc::now, |parsed| parsed.with_timezone(&Utc));

    OrderSnapshot {
        order_id: OrderId::new(order_id),
        total,
        placed_at,
    }
}

/// Pull the human-readable message out of an error body, when there is one.
#[must_use]
pub(super) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}

fn int_field(body: &Value, names: &[&str]) -> Option<i32> {
    names
        .iter()
        .filter_map(|name| body.get(name)?.as_i64())
        .next()
        .and_then(|v| i32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_snapshot_field_aliases() {
        let body = json!({ "recordId": 3, "amount": 2, "stock": 5 });
        let snapshot = decode_line_snapshot(&body).expect("snapshot");
        assert_eq!(snapshot.record_id, RecordId::new(3));
        assert_eq!(snapshot.quantity, 2);
        assert_eq!(snapshot.stock, Some(5));

        let body = json!({ "idRecord": 4, "quantity": 1 });
        let snapshot = decode_line_snapshot(&body).expect("snapshot");
        assert_eq!(snapshot.record_id, RecordId::new(4));
        assert_eq!(snapshot.stock, None);
    }

    #[test]
    fn test_line_snapshot_requires_record_id() {
        assert!(decode_line_snapshot(&json!({ "amount": 2 })).is_none());
        assert!(decode_line_snapshot(&json!(null)).is_none());
        assert!(decode_line_snapshot(&json!("ok")).is_none());
    }

    #[test]
    fn test_order_snapshot_defaults() {
        let order = decode_order_snapshot(&json!({}));
        assert_eq!(order.order_id, OrderId::new(0));
        assert_eq!(order.total, Price::ZERO);
    }

    #[test]
    fn test_order_snapshot_fields() {
        let order = decode_order_snapshot(&json!({
            "idOrder": 12,
            "totalAmount": 34.5,
            "orderDate": "2026-03-01T10:00:00Z"
        }));
        assert_eq!(order.order_id, OrderId::new(12));
        assert_eq!(order.total, Price::from_f64_lossy(34.5));
        assert_eq!(order.placed_at.to_rfc3339(), "2026-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Insufficient stock"}"#),
            Some("Insufficient stock".to_owned())
        );
        assert_eq!(error_message(r#"{"message":""}"#), None);
        assert_eq!(error_message("not json"), None);
        assert_eq!(error_message(r#"{"error":"other"}"#), None);
    }
}
