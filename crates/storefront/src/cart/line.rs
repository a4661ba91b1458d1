//! Cart view model and aggregate totals.

use serde::Serialize;
use serde_json::Value;
use spindle_core::{CartId, CartLineId, Price, RecordId};

use super::group::{NO_GROUP, extract_group_label};
use super::payload::{DEFAULT_TITLE, PLACEHOLDER_IMAGE, RawCartLine};

/// Catalog data for one record, fetched separately from the cart itself.
///
/// Transient: merged into the matching [`CartLine`] during enrichment and
/// retained only as that line's `record` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSnapshot {
    pub title: String,
    pub image_ref: String,
    pub price: Price,
    pub stock: Option<u32>,
    pub group_label: String,
}

impl RecordSnapshot {
    /// Decode a snapshot from a raw record detail, tolerating missing and
    /// oddly typed fields the same way the cart payload decoder does.
    #[must_use]
    pub fn from_detail(detail: &Value) -> Self {
        Self {
            title: str_field(detail, "titleRecord").unwrap_or_default(),
            image_ref: str_field(detail, "imageRecord").unwrap_or_default(),
            price: detail
                .get("price")
                .and_then(Value::as_f64)
                .map_or(Price::ZERO, Price::from_f64_lossy),
            stock: detail
                .get("stock")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok()),
            group_label: extract_group_label(detail),
        }
    }
}

fn str_field(detail: &Value, field: &str) -> Option<String> {
    detail
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// One merchandise line of the cart view model.
///
/// Rebuilt wholesale on every normalization pass; identity across reloads is
/// by `record_id`/`line_id` matching only. The line total is always derived
/// from `unit_price` and `quantity` - see [`CartLine::line_total`] - and
/// cannot be set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub line_id: CartLineId,
    pub cart_id: CartId,
    pub record_id: RecordId,
    pub quantity: u32,
    pub unit_price: Price,
    pub title: String,
    pub image_ref: String,
    pub group_label: String,
    pub stock: Option<u32>,
    pub record: Option<RecordSnapshot>,
}

impl CartLine {
    /// The line total, always `unit_price x quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Build the consumer-facing view model from normalized raw lines.
///
/// Keeps only lines with a positive quantity, in input order, and completes
/// every field with the same defaults the payload decoder uses so no
/// consumer ever sees a missing value.
#[must_use]
pub fn build_view_lines(raw: &[RawCartLine]) -> Vec<CartLine> {
    raw.iter()
        .filter(|line| line.quantity > 0)
        .map(|line| CartLine {
            line_id: line.line_id,
            cart_id: line.cart_id,
            record_id: line.record_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            title: defaulted(&line.title, DEFAULT_TITLE),
            image_ref: defaulted(&line.image_ref, PLACEHOLDER_IMAGE),
            group_label: defaulted(&line.group_label, NO_GROUP),
            stock: line.stock,
            record: None,
        })
        .collect()
}

fn defaulted(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_owned()
    } else {
        value.to_owned()
    }
}

/// Derived cart totals, pushed to the navigation badge.
///
/// Never cached: recomputed after every load, mutation, and reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartAggregate {
    /// Sum of quantities across all lines.
    pub total_items: u32,
    /// Sum of line totals across all lines.
    pub total_price: Price,
}

impl CartAggregate {
    /// Empty cart.
    pub const ZERO: Self = Self {
        total_items: 0,
        total_price: Price::ZERO,
    };

    /// Pure reduction over the current view model.
    #[must_use]
    pub fn compute(lines: &[CartLine]) -> Self {
        Self {
            total_items: lines.iter().map(|l| l.quantity).sum(),
            total_price: lines.iter().map(CartLine::line_total).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(record_id: i32, quantity: u32, price: f64) -> RawCartLine {
        RawCartLine {
            line_id: CartLineId::new(record_id),
            cart_id: CartId::new(1),
            record_id: RecordId::new(record_id),
            quantity,
            unit_price: Price::from_f64_lossy(price),
            title: format!("Record {record_id}"),
            image_ref: "img/r.jpg".to_owned(),
            group_label: "Some Group".to_owned(),
            stock: None,
        }
    }

    #[test]
    fn test_non_positive_quantities_dropped() {
        let lines = build_view_lines(&[raw(1, 0, 5.0), raw(2, 3, 5.0)]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].record_id, RecordId::new(2));
    }

    #[test]
    fn test_order_preserved() {
        let lines = build_view_lines(&[raw(3, 1, 1.0), raw(1, 1, 1.0), raw(2, 1, 1.0)]);
        let ids: Vec<i32> = lines.iter().map(|l| l.record_id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_strings_completed() {
        let mut bare = raw(1, 1, 1.0);
        bare.title = String::new();
        bare.image_ref = String::new();
        bare.group_label = String::new();
        let lines = build_view_lines(&[bare]);
        assert_eq!(lines[0].title, DEFAULT_TITLE);
        assert_eq!(lines[0].image_ref, PLACEHOLDER_IMAGE);
        assert_eq!(lines[0].group_label, NO_GROUP);
    }

    #[test]
    fn test_line_total_derived() {
        let lines = build_view_lines(&[raw(1, 3, 9.99)]);
        assert_eq!(lines[0].line_total(), Price::from_f64_lossy(9.99).times(3));
    }

    #[test]
    fn test_aggregate_reduction() {
        let lines = build_view_lines(&[raw(1, 2, 10.0), raw(2, 1, 5.0)]);
        let aggregate = CartAggregate::compute(&lines);
        assert_eq!(aggregate.total_items, 3);
        assert_eq!(aggregate.total_price, Price::from_f64_lossy(25.0));
    }

    #[test]
    fn test_aggregate_of_empty_is_zero() {
        assert_eq!(CartAggregate::compute(&[]), CartAggregate::ZERO);
    }

    #[test]
    fn test_snapshot_from_detail() {
        let detail = serde_json::json!({
            "titleRecord": "Forever Changes",
            "imageRecord": "img/fc.jpg",
            "price": 21.0,
            "stock": 2,
            "recordGroup": { "name": "Love" }
        });
        let snapshot = RecordSnapshot::from_detail(&detail);
        assert_eq!(snapshot.title, "Forever Changes");
        assert_eq!(snapshot.stock, Some(2));
        assert_eq!(snapshot.group_label, "Love");
    }
}
