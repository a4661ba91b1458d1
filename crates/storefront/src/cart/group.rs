//! Group (artist) label extraction.
//!
//! The shop API has gone through several schema revisions and reports the
//! group a record belongs to under a dozen different paths, sometimes with
//! HTML entities baked in. This probes them all and cleans up whatever it
//! finds first.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Label used when no usable group name can be found.
pub const NO_GROUP: &str = "N/A";

/// Sentinel values the API emits for "unset".
const SENTINELS: &[&str] = &["N/A", "string"];

/// Candidate paths, probed in order. Earlier revisions put the label on the
/// detail itself, later ones nest it under `record`, `group`, `recordGroup`.
const GROUP_PATHS: &[&[&str]] = &[
    &["groupName"],
    &["nameGroup"],
    &["group", "name"],
    &["record", "groupName"],
    &["record", "nameGroup"],
    &["record", "group", "name"],
    &["record", "recordGroup", "name"],
    &["recordGroup", "name"],
    &["record", "group", "groupName"],
    &["record", "recordGroup", "groupName"],
    &["record", "group", "description"],
    &["record", "recordGroup", "description"],
];

static HTML_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[^;]+;").expect("Invalid regex"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Extract the group label from a detail object.
///
/// Probes the known candidate paths in order and returns the first non-empty
/// string that is not an "unset" sentinel, with HTML entities stripped and
/// whitespace collapsed. Returns [`NO_GROUP`] when nothing qualifies.
///
/// Pure and deterministic; never fails.
#[must_use]
pub fn extract_group_label(detail: &Value) -> String {
    let candidate = GROUP_PATHS
        .iter()
        .filter_map(|path| lookup(detail, path))
        .find(|name| !name.is_empty() && !SENTINELS.contains(name));

    match candidate {
        Some(raw) => {
            let cleaned = clean_label(raw);
            if cleaned.is_empty() {
                NO_GROUP.to_owned()
            } else {
                cleaned
            }
        }
        None => NO_GROUP.to_owned(),
    }
}

/// Walk a nested field path, returning the string at its end if there is one.
fn lookup<'a>(detail: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = detail;
    for segment in path {
        current = current.get(segment)?;
    }
    current.as_str()
}

/// Strip HTML entities, collapse whitespace runs, and trim.
fn clean_label(raw: &str) -> String {
    let stripped = HTML_ENTITY.replace_all(raw, "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_owned()
}
