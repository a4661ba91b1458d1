//! Cart payload normalization.
//!
//! The shop API serializes cart contents in three shapes depending on the
//! endpoint revision and serializer settings: a bare array, a
//! `{"$values": [...]}` reference-preserving envelope, or a keyed object
//! whose values are the lines. [`decode_cart_payload`] folds all of them
//! into one ordered sequence of fully defaulted raw lines. Malformed
//! elements degrade to placeholders; nothing here can fail.

use serde_json::{Map, Value};
use spindle_core::{CartId, CartLineId, Price, RecordId};

use super::group::extract_group_label;

/// Default title for lines whose record has none.
pub const DEFAULT_TITLE: &str = "No Title";
/// Placeholder image path for lines without artwork.
pub const PLACEHOLDER_IMAGE: &str = "assets/img/placeholder.png";

/// One cart line as reported by the API, every field defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCartLine {
    pub line_id: CartLineId,
    pub cart_id: CartId,
    pub record_id: RecordId,
    pub quantity: u32,
    pub unit_price: Price,
    pub title: String,
    pub image_ref: String,
    pub group_label: String,
    pub stock: Option<u32>,
}

impl RawCartLine {
    /// Zero-valued placeholder for elements that are not objects at all.
    fn placeholder() -> Self {
        Self {
            line_id: CartLineId::new(0),
            cart_id: CartId::new(0),
            record_id: RecordId::new(0),
            quantity: 0,
            unit_price: Price::ZERO,
            title: DEFAULT_TITLE.to_owned(),
            image_ref: PLACEHOLDER_IMAGE.to_owned(),
            group_label: super::group::NO_GROUP.to_owned(),
            stock: None,
        }
    }
}

/// The recognized payload shapes, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CartPayload<'a> {
    /// Already a sequence of lines.
    Lines(&'a [Value]),
    /// Reference-preserving envelope carrying the sequence under `$values`.
    Enveloped(&'a [Value]),
    /// Keyed object; its values are the lines, in enumeration order.
    Keyed(&'a Map<String, Value>),
    /// Null or a primitive; nothing to extract.
    Empty,
}

/// Classify an arbitrary JSON value into one of the payload shapes.
fn classify(value: &Value) -> CartPayload<'_> {
    match value {
        Value::Array(items) => CartPayload::Lines(items),
        Value::Object(map) => {
            // `$values` is what the serializer actually emits; plain `values`
            // has been seen from one proxy deployment.
            if let Some(Value::Array(items)) = map.get("$values").or_else(|| map.get("values")) {
                CartPayload::Enveloped(items)
            } else {
                CartPayload::Keyed(map)
            }
        }
        _ => CartPayload::Empty,
    }
}

/// Decode an arbitrary cart payload into an ordered sequence of raw lines.
///
/// Never fails: elements that are not objects become zero placeholders, and
/// every field of object elements is coalesced through a fixed fallback
/// chain so downstream consumers see no missing values.
#[must_use]
pub fn decode_cart_payload(value: &Value) -> Vec<RawCartLine> {
    match classify(value) {
        CartPayload::Lines(items) | CartPayload::Enveloped(items) => {
            items.iter().map(decode_line).collect()
        }
        CartPayload::Keyed(map) => map.values().map(decode_line).collect(),
        CartPayload::Empty => Vec::new(),
    }
}

/// Default one raw element into a complete line.
fn decode_line(detail: &Value) -> RawCartLine {
    if !detail.is_object() {
        return RawCartLine::placeholder();
    }

    let title = string_at(detail, &[&["titleRecord"], &["recordTitle"], &["record", "titleRecord"]])
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned());
    let image_ref = string_at(detail, &[&["imageRecord"], &["record", "imageRecord"]])
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned());
    let unit_price = price_at(detail, &[&["price"], &["record", "price"]]);

    RawCartLine {
        line_id: CartLineId::new(id_at(detail, "idCartDetail")),
        cart_id: CartId::new(id_at(detail, "cartId")),
        record_id: RecordId::new(id_at(detail, "recordId")),
        quantity: quantity_at(detail, "amount"),
        unit_price,
        title,
        image_ref,
        group_label: extract_group_label(detail),
        stock: count_at(detail, &[&["stock"], &["record", "stock"]]),
    }
}

/// First non-empty string among the candidate paths.
fn string_at(detail: &Value, paths: &[&[&str]]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| walk(detail, path)?.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

/// First numeric value among the candidate paths, as a clamped price.
fn price_at(detail: &Value, paths: &[&[&str]]) -> Price {
    paths
        .iter()
        .filter_map(|path| number(walk(detail, path)?))
        .next()
        .map_or(Price::ZERO, Price::from_f64_lossy)
}

/// First non-negative integer among the candidate paths.
fn count_at(detail: &Value, paths: &[&[&str]]) -> Option<u32> {
    paths
        .iter()
        .filter_map(|path| number(walk(detail, path)?))
        .next()
        .map(clamp_to_u32)
}

/// Integer id at a direct field, defaulting to 0.
fn id_at(detail: &Value, field: &str) -> i32 {
    detail
        .get(field)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(0)
}

/// Quantity at a direct field, clamped to >= 0 and defaulting to 0.
fn quantity_at(detail: &Value, field: &str) -> u32 {
    detail
        .get(field)
        .and_then(number)
        .map_or(0, clamp_to_u32)
}

/// Read a JSON value as a number, tolerating numeric strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_to_u32(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Walk a nested field path.
fn walk<'a>(detail: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = detail;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}
