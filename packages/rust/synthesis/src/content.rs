//! Content coercion: turns one arbitrarily-shaped JSON value into a
//! renderable [`SectionContent`] or a list of [`FindingEntry`] points.
//!
//! Generative backends disagree on what to call "the text of a finding"
//! and "its title". Both are found by scanning fixed, ordered key lists;
//! the first match wins, so the slice order below is part of the contract.

use serde_json::{Map, Value};

use researchdesk_shared::{EntryContent, FindingEntry, SectionContent};

/// Keys that may carry an entry's label, in priority order.
pub const HEADING_KEYS: [&str; 4] = ["heading", "title", "name", "label"];

/// Keys that may carry an entry's text, in priority order.
pub const CONTENT_KEYS: [&str; 13] = [
    "content",
    "text",
    "summary",
    "finding",
    "insight",
    "value",
    "point",
    "statement",
    "details",
    "description",
    "body",
    "item",
    "bullet",
];

/// Normalize a value into section content.
///
/// Lists become finding entries, a mapping is read as a single finding
/// and contributes its content, strings are trimmed. Returns `None` when
/// nothing usable remains. Numbers and booleans pass through untouched.
pub fn prepare_content(value: &Value) -> Option<SectionContent> {
    match value {
        Value::Array(items) => {
            let entries = normalize_list_items(items);
            (!entries.is_empty()).then_some(SectionContent::Entries(entries))
        }
        Value::Object(map) => coerce_dict_item(map).map(|entry| entry.content.into()),
        Value::String(text) => non_blank(text).map(SectionContent::Text),
        Value::Null => None,
        other => Some(SectionContent::Raw(other.clone())),
    }
}

/// Normalize every element of a list into a finding entry, in order.
///
/// Mappings go through [`coerce_dict_item`]; anything else is stringified
/// and kept when non-blank. `null` elements are dropped.
pub fn normalize_list_items(items: &[Value]) -> Vec<FindingEntry> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => coerce_dict_item(map),
            Value::Null => None,
            other => non_blank(&display_value(other)).map(FindingEntry::text),
        })
        .collect()
}

/// Read a single finding out of a mapping.
///
/// The heading is the first non-blank string under [`HEADING_KEYS`]. The
/// content is the value of the first [`CONTENT_KEYS`] key present; when
/// none is present (or its value is `null`), the remaining keys are
/// folded into `"key: value; key: value"`. Returns `None` when the
/// resulting content is empty.
pub fn coerce_dict_item(item: &Map<String, Value>) -> Option<FindingEntry> {
    let heading = HEADING_KEYS.iter().find_map(|key| {
        item.get(*key)
            .and_then(Value::as_str)
            .and_then(non_blank)
    });

    let content = match CONTENT_KEYS.iter().find_map(|key| item.get(*key)) {
        Some(value) if !value.is_null() => normalize_entry_value(value),
        _ => leftover_summary(item)
            .and_then(|text| non_blank(&text))
            .map(EntryContent::Text),
    }?;

    Some(FindingEntry { content, heading })
}

/// Recursive content normalization for a value found under a content key.
fn normalize_entry_value(value: &Value) -> Option<EntryContent> {
    match value {
        Value::Array(items) => {
            let entries = normalize_list_items(items);
            (!entries.is_empty()).then_some(EntryContent::Entries(entries))
        }
        Value::Object(map) => coerce_dict_item(map).map(|entry| entry.content),
        Value::String(text) => non_blank(text).map(EntryContent::Text),
        other if is_truthy(other) => Some(EntryContent::Text(display_value(other))),
        _ => None,
    }
}

/// Fold keys that are neither heading nor content keys into one line.
fn leftover_summary(item: &Map<String, Value>) -> Option<String> {
    let parts: Vec<String> = item
        .iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| format!("{key}: {}", display_value(value)))
        .collect();

    (!parts.is_empty()).then(|| parts.join("; "))
}

fn is_reserved_key(key: &str) -> bool {
    HEADING_KEYS.contains(&key) || CONTENT_KEYS.contains(&key)
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// Trim `text`, returning `None` when nothing is left.
pub(crate) fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Human-readable text for a scalar or nested value.
///
/// Strings are returned verbatim (no JSON quoting); everything else uses
/// its compact JSON form.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Loose truthiness used when probing weakly-typed payloads: `null`,
/// `false`, zero, and empty strings/lists/maps are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Wrap a value that is used as-is: strings stay text, the rest is raw.
pub(crate) fn raw_content(value: &Value) -> SectionContent {
    match value {
        Value::String(text) => SectionContent::Text(text.clone()),
        other => SectionContent::Raw(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn heading_key_wins_over_title() {
        let entry = coerce_dict_item(&obj(json!({"title": "A", "heading": "B", "text": "x"})))
            .expect("entry");
        assert_eq!(entry.heading.as_deref(), Some("B"));
    }

    #[test]
    fn blank_heading_falls_through_to_next_key() {
        let entry = coerce_dict_item(&obj(json!({"heading": "  ", "label": "L", "text": "x"})))
            .expect("entry");
        assert_eq!(entry.heading.as_deref(), Some("L"));
    }

    #[test]
    fn content_key_priority() {
        let entry =
            coerce_dict_item(&obj(json!({"text": "Y", "content": "X"}))).expect("entry");
        assert_eq!(entry.content, EntryContent::Text("X".into()));
        assert!(entry.heading.is_none());
    }

    #[test]
    fn first_present_content_key_is_final_even_if_blank() {
        // `content` is present but blank; `text` is never consulted.
        assert!(coerce_dict_item(&obj(json!({"content": "  ", "text": "Y"}))).is_none());
    }

    #[test]
    fn heading_only_item_is_dropped() {
        assert!(coerce_dict_item(&obj(json!({"heading": "H"}))).is_none());
    }

    #[test]
    fn leftovers_become_key_value_pairs() {
        let entry = coerce_dict_item(&obj(json!({
            "title": "Stat",
            "metric": "latency",
            "p99": 120,
            "note": null
        })))
        .expect("entry");
        assert_eq!(entry.heading.as_deref(), Some("Stat"));
        assert_eq!(entry.content, EntryContent::Text("metric: latency; p99: 120".into()));
    }

    #[test]
    fn null_content_key_falls_back_to_leftovers() {
        let entry = coerce_dict_item(&obj(json!({"content": null, "source": "survey"})))
            .expect("entry");
        assert_eq!(entry.content, EntryContent::Text("source: survey".into()));
    }

    #[test]
    fn citation_leftover_ignored_when_content_key_matches() {
        let entry = coerce_dict_item(&obj(json!({"finding": "F2", "citation": "[1]"})))
            .expect("entry");
        assert_eq!(entry, FindingEntry::text("F2"));
    }

    #[test]
    fn nested_mapping_content_recurses() {
        let entry = coerce_dict_item(&obj(json!({
            "heading": "Outer",
            "details": {"heading": "Inner", "text": "  deep  "}
        })))
        .expect("entry");
        assert_eq!(entry.heading.as_deref(), Some("Outer"));
        assert_eq!(entry.content, EntryContent::Text("deep".into()));
    }

    #[test]
    fn list_content_becomes_nested_entries() {
        let entry = coerce_dict_item(&obj(json!({
            "heading": "Group",
            "content": ["a", {"point": "b"}, "", null]
        })))
        .expect("entry");
        assert_eq!(
            entry.content,
            EntryContent::Entries(vec![FindingEntry::text("a"), FindingEntry::text("b")])
        );
    }

    #[test]
    fn scalar_content_is_stringified_and_falsy_dropped() {
        let entry = coerce_dict_item(&obj(json!({"value": 42}))).expect("entry");
        assert_eq!(entry.content, EntryContent::Text("42".into()));
        assert!(coerce_dict_item(&obj(json!({"value": 0}))).is_none());
        assert!(coerce_dict_item(&obj(json!({"value": false}))).is_none());
    }

    #[test]
    fn recoercing_normalized_entry_is_stable() {
        let first = coerce_dict_item(&obj(json!({"insight": "  s  ", "label": "L"})))
            .expect("entry");
        let reserialized = obj(serde_json::to_value(&first).expect("serialize"));
        let second = coerce_dict_item(&reserialized).expect("entry");
        assert_eq!(first, second);
    }

    #[test]
    fn list_items_keep_order_and_drop_empties() {
        let entries = normalize_list_items(&[
            json!("  one "),
            json!({"heading": "H"}),
            json!(2),
            json!(null),
            json!(""),
            json!(true),
        ]);
        assert_eq!(
            entries,
            vec![
                FindingEntry::text("one"),
                FindingEntry::text("2"),
                FindingEntry::text("true"),
            ]
        );
    }

    #[test]
    fn prepare_content_shapes() {
        assert_eq!(
            prepare_content(&json!(["a", "b"])),
            Some(SectionContent::Entries(vec![
                FindingEntry::text("a"),
                FindingEntry::text("b")
            ]))
        );
        assert_eq!(prepare_content(&json!([])), None);
        assert_eq!(prepare_content(&json!(["", null])), None);
        assert_eq!(
            prepare_content(&json!({"summary": "S", "title": "T"})),
            Some(SectionContent::Text("S".into()))
        );
        assert_eq!(prepare_content(&json!({"heading": "only"})), None);
        assert_eq!(
            prepare_content(&json!("  text ")),
            Some(SectionContent::Text("text".into()))
        );
        assert_eq!(prepare_content(&json!("   ")), None);
        assert_eq!(prepare_content(&json!(null)), None);
        assert_eq!(prepare_content(&json!(7)), Some(SectionContent::Raw(json!(7))));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(" ")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!(0.0)));
        assert!(is_truthy(&json!(-1)));
    }
}
