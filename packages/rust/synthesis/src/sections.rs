//! Section coercion: a top-level `sections` list of unknown shape into
//! `{heading, content}` sections.

use serde_json::{Map, Value};

use researchdesk_shared::{Section, SectionContent};

use crate::content::{HEADING_KEYS, display_value, is_truthy, prepare_content, raw_content};

/// Keys that may carry a section heading, in priority order.
pub const SECTION_HEADING_KEYS: [&str; 3] = ["heading", "title", "name"];

/// Keys consulted for section content when `content` is absent, in priority order.
pub const SECTION_CONTENT_KEYS: [&str; 7] =
    ["text", "body", "summary", "details", "value", "items", "bullets"];

/// Coerce a list of arbitrary items into sections, one per item.
///
/// Non-list input yields no sections. Items are never dropped here, even
/// when their content ends up empty; the normalizer filters those.
pub fn coerce_sections(raw: &Value) -> Vec<Section> {
    let Value::Array(items) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| coerce_section(idx, item))
        .collect()
}

fn coerce_section(idx: usize, item: &Value) -> Section {
    match item {
        Value::Object(map) => {
            let heading = section_heading(map).unwrap_or_else(|| format!("Section {}", idx + 1));
            let content = match section_content_candidate(map) {
                Some(candidate) => {
                    prepare_content(&candidate).unwrap_or_else(|| raw_content(&candidate))
                }
                None => SectionContent::Raw(Value::Null),
            };
            Section::new(heading, content)
        }
        Value::String(text) => Section::text(format!("Section {}", idx + 1), text.trim()),
        other => Section::new(format!("Section {}", idx + 1), raw_content(other)),
    }
}

fn section_heading(map: &Map<String, Value>) -> Option<String> {
    SECTION_HEADING_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| is_truthy(value))
        .map(display_value)
}

/// Pick the value that carries the section body.
///
/// `content` wins when non-null, then the first non-null fallback key.
/// Without any, everything except the heading keys is kept as an object.
fn section_content_candidate(map: &Map<String, Value>) -> Option<Value> {
    if let Some(content) = map.get("content").filter(|v| !v.is_null()) {
        return Some(content.clone());
    }

    if let Some(value) = SECTION_CONTENT_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
    {
        return Some(value.clone());
    }

    let leftovers: Map<String, Value> = map
        .iter()
        .filter(|(key, _)| !HEADING_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    (!leftovers.is_empty()).then_some(Value::Object(leftovers))
}

#[cfg(test)]
mod tests {
    use researchdesk_shared::FindingEntry;
    use serde_json::json;

    use super::*;

    #[test]
    fn list_of_strings_becomes_numbered_sections() {
        let sections = coerce_sections(&json!(["point A", "point B"]));
        assert_eq!(
            sections,
            vec![
                Section::text("Section 1", "point A"),
                Section::text("Section 2", "point B"),
            ]
        );
    }

    #[test]
    fn non_list_input_yields_nothing() {
        assert!(coerce_sections(&json!(null)).is_empty());
        assert!(coerce_sections(&json!({"heading": "x"})).is_empty());
        assert!(coerce_sections(&json!("text")).is_empty());
    }

    #[test]
    fn mapping_item_uses_heading_then_title() {
        let sections = coerce_sections(&json!([
            {"title": "Executive Summary", "text": "Overview text"},
            {"heading": "", "title": "Fallback title", "content": "c"},
            {"content": "no heading"}
        ]));
        assert_eq!(sections[0], Section::text("Executive Summary", "Overview text"));
        assert_eq!(sections[1].heading, "Fallback title");
        assert_eq!(sections[2].heading, "Section 3");
    }

    #[test]
    fn list_content_is_normalized_to_entries() {
        let sections = coerce_sections(&json!([
            {"heading": "Key Findings", "content": ["Point 1", "Point 2"]}
        ]));
        assert_eq!(
            sections[0].content,
            SectionContent::Entries(vec![
                FindingEntry::text("Point 1"),
                FindingEntry::text("Point 2")
            ])
        );
    }

    #[test]
    fn dict_items_in_content_list() {
        let sections = coerce_sections(&json!([{
            "heading": "Key Findings",
            "content": [
                {"finding": "Flow improves focus", "citation": "[1]"},
                {"finding": "Breaks sustain flow"}
            ]
        }]));
        let entries = sections[0].content.as_entries().expect("entries");
        assert_eq!(entries[0], FindingEntry::text("Flow improves focus"));
        assert_eq!(entries[1], FindingEntry::text("Breaks sustain flow"));
    }

    #[test]
    fn fallback_content_keys_skip_nulls() {
        let sections = coerce_sections(&json!([
            {"heading": "H", "content": null, "text": null, "body": "from body"}
        ]));
        assert_eq!(sections[0], Section::text("H", "from body"));
    }

    #[test]
    fn leftovers_feed_content_coercion() {
        let sections = coerce_sections(&json!([
            {"heading": "Metrics", "insight": "  throughput doubled "}
        ]));
        assert_eq!(sections[0], Section::text("Metrics", "throughput doubled"));
    }

    #[test]
    fn uncoercible_leftovers_are_kept_raw() {
        let sections = coerce_sections(&json!([{"heading": "H", "score": null}]));
        assert_eq!(
            sections[0].content,
            SectionContent::Raw(json!({"score": null}))
        );
    }

    #[test]
    fn heading_only_item_still_emits_a_section() {
        let sections = coerce_sections(&json!([{"heading": "Empty"}]));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Empty");
        assert!(sections[0].content.is_empty());
    }

    #[test]
    fn scalars_and_nested_lists_pass_through() {
        let sections = coerce_sections(&json!([3, ["a"], "  ", null]));
        assert_eq!(sections[0].content, SectionContent::Raw(json!(3)));
        assert_eq!(sections[1].content, SectionContent::Raw(json!(["a"])));
        assert_eq!(sections[2], Section::text("Section 3", ""));
        assert_eq!(sections[3].content, SectionContent::Raw(json!(null)));
    }

    #[test]
    fn non_string_heading_is_stringified() {
        let sections = coerce_sections(&json!([{"name": 2024, "content": "x"}]));
        assert_eq!(sections[0].heading, "2024");
    }
}
