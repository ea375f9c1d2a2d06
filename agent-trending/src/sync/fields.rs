//! Cell encoding for system-owned columns, and value normalization.
//!
//! The table accepts plain values on write but reads them back in richer
//! shapes (text as segment arrays, URLs as objects, integers as floats).
//! Comparisons go through [`normalize`] so that an unchanged row is never
//! rewritten.

use crate::aggregate::RepoRecord;
use crate::config::FieldNames;
use crate::sync::FieldMap;
use serde_json::{json, Value};
use std::collections::HashSet;

/// Characters of description written to the table.
pub const DESCRIPTION_LIMIT: usize = 2000;

/// Topics written to the tags column.
pub const TAG_LIMIT: usize = 10;

/// Encoded system-owned values for `record`, key column excluded.
///
/// `Value::Null` stands for "no value".
pub fn system_values<'a>(record: &RepoRecord, names: &'a FieldNames) -> Vec<(&'a str, Value)> {
    let description: String = record.description.chars().take(DESCRIPTION_LIMIT).collect();
    let tags = record
        .topics
        .iter()
        .take(TAG_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        (names.description.as_str(), text(description)),
        (names.stars.as_str(), json!(record.stars)),
        (names.forks.as_str(), json!(record.forks)),
        (
            names.language.as_str(),
            record.language.clone().map_or(Value::Null, text),
        ),
        (
            names.link.as_str(),
            json!({ "link": record.url, "text": record.name }),
        ),
        (names.author.as_str(), text(record.owner.clone())),
        (names.tags.as_str(), text(tags)),
        (
            names.updated_time.as_str(),
            record
                .last_updated
                .map_or(Value::Null, |t| json!(t.timestamp_millis())),
        ),
    ]
}

/// Fields for a new row: the key plus every system-owned value present.
pub fn create_payload(record: &RepoRecord, names: &FieldNames) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(names.project_name.clone(), json!(record.full_name));
    for (name, value) in system_values(record, names) {
        if !value.is_null() {
            fields.insert(name.to_string(), value);
        }
    }
    fields
}

/// System-owned fields whose normalized value differs from `remote`.
///
/// An empty map means the row is unchanged. A `Null` entry clears a cell
/// the record no longer has a value for.
pub fn update_payload(record: &RepoRecord, remote: &FieldMap, names: &FieldNames) -> FieldMap {
    let mut fields = FieldMap::new();
    for (name, value) in system_values(record, names) {
        if normalize(Some(&value)) != normalize(remote.get(name)) {
            fields.insert(name.to_string(), value);
        }
    }
    fields
}

/// Drops every entry whose column is not in `columns`, except the key.
///
/// `None` means the table's columns are unknown and nothing is dropped.
pub fn retain_columns(
    fields: &mut FieldMap,
    columns: Option<&HashSet<String>>,
    names: &FieldNames,
) {
    if let Some(columns) = columns {
        fields.retain(|name, _| *name == names.project_name || columns.contains(name));
    }
}

/// Canonical form of a cell value for comparison.
#[must_use]
pub fn normalize(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(s)) if s.is_empty() => Value::Null,
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(Value::Number(n)) => n.as_f64().map_or(Value::Null, Value::from),
        Some(Value::Array(items)) if items.is_empty() => Value::Null,
        Some(Value::Array(items)) if items.iter().all(is_text_segment) => {
            normalize(Some(&Value::String(concat_segments(items))))
        }
        Some(Value::Array(items)) => {
            Value::Array(items.iter().map(|item| normalize(Some(item))).collect())
        }
        Some(Value::Object(map)) if map.contains_key("link") => json!({
            "link": normalize(map.get("link")),
            "text": normalize(map.get("text")),
        }),
        Some(other) => other.clone(),
    }
}

/// Reads a text cell as a plain string.
///
/// Accepts a string or a segment array; anything else yields `None`.
#[must_use]
pub fn text_value(value: Option<&Value>) -> Option<String> {
    match normalize(value) {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn text(s: String) -> Value {
    if s.is_empty() {
        Value::Null
    } else {
        Value::String(s)
    }
}

fn is_text_segment(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|segment| segment.get("text").is_some_and(Value::is_string))
}

fn concat_segments(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(|segment| segment.get("text").and_then(Value::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RawHit;
    use chrono::{TimeZone, Utc};

    fn record() -> RepoRecord {
        RepoRecord::from_hit(RawHit {
            label: "ai-agent".to_string(),
            full_name: "a/x".to_string(),
            name: "x".to_string(),
            description: "Agent toolkit".to_string(),
            stars: 12,
            forks: 3,
            language: Some("Rust".to_string()),
            owner: "a".to_string(),
            topics: vec!["llm".to_string(), "agent".to_string()],
            last_updated: Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()),
        })
    }

    /// The same row as the table returns it after a create.
    fn remote_echo(names: &FieldNames) -> FieldMap {
        let mut remote = FieldMap::new();
        remote.insert(
            names.project_name.clone(),
            json!([{ "type": "text", "text": "a/x" }]),
        );
        remote.insert(
            names.description.clone(),
            json!([{ "type": "text", "text": "Agent " }, { "type": "text", "text": "toolkit" }]),
        );
        remote.insert(names.stars.clone(), json!(12.0));
        remote.insert(names.forks.clone(), json!(3));
        remote.insert(names.language.clone(), json!("Rust"));
        remote.insert(
            names.link.clone(),
            json!({ "link": "https://github.com/a/x", "text": "x" }),
        );
        remote.insert(names.author.clone(), json!("a"));
        remote.insert(names.tags.clone(), json!("llm, agent"));
        remote.insert(names.updated_time.clone(), json!(1_790_812_800_000i64));
        remote.insert(names.notes.clone(), json!("keep me"));
        remote
    }

    #[test]
    fn retain_columns_keeps_key_and_known_columns() {
        let names = FieldNames::default();
        let mut payload = create_payload(&record(), &names);
        let columns: HashSet<String> = [names.stars.clone(), names.link.clone()].into();

        retain_columns(&mut payload, Some(&columns), &names);

        let mut kept: Vec<&str> = payload.keys().map(String::as_str).collect();
        kept.sort_unstable();
        let mut expected = vec![
            names.project_name.as_str(),
            names.stars.as_str(),
            names.link.as_str(),
        ];
        expected.sort_unstable();
        assert_eq!(kept, expected);

        let mut untouched = create_payload(&record(), &names);
        retain_columns(&mut untouched, None, &names);
        assert_eq!(untouched, create_payload(&record(), &names));
    }

    #[test]
    fn create_payload_has_key_and_system_fields_only() {
        let names = FieldNames::default();
        let payload = create_payload(&record(), &names);

        assert_eq!(payload[&names.project_name], json!("a/x"));
        assert_eq!(payload[&names.stars], json!(12));
        assert_eq!(payload[&names.tags], json!("llm, agent"));
        assert_eq!(
            payload[&names.link],
            json!({ "link": "https://github.com/a/x", "text": "x" })
        );
        for user in names.user_owned() {
            assert!(!payload.contains_key(user));
        }
    }

    #[test]
    fn create_payload_omits_missing_values() {
        let names = FieldNames::default();
        let mut record = record();
        record.language = None;
        record.description.clear();
        record.last_updated = None;

        let payload = create_payload(&record, &names);

        assert!(!payload.contains_key(&names.language));
        assert!(!payload.contains_key(&names.description));
        assert!(!payload.contains_key(&names.updated_time));
    }

    #[test]
    fn echoed_row_is_unchanged() {
        let names = FieldNames::default();
        assert!(update_payload(&record(), &remote_echo(&names), &names).is_empty());
    }

    #[test]
    fn update_payload_contains_only_differences() {
        let names = FieldNames::default();
        let mut record = record();
        record.stars = 20;
        record.language = None;

        let payload = update_payload(&record, &remote_echo(&names), &names);

        assert_eq!(payload.len(), 2);
        assert_eq!(payload[&names.stars], json!(20));
        assert_eq!(payload[&names.language], Value::Null);
    }

    #[test]
    fn description_is_truncated_by_characters() {
        let names = FieldNames::default();
        let mut record = record();
        record.description = "智".repeat(DESCRIPTION_LIMIT + 5);

        let payload = create_payload(&record, &names);

        let written = payload[&names.description].as_str().unwrap();
        assert_eq!(written.chars().count(), DESCRIPTION_LIMIT);
    }

    #[test]
    fn empty_values_normalize_to_null() {
        for value in [json!(null), json!(""), json!([])] {
            assert_eq!(normalize(Some(&value)), Value::Null);
        }
        assert_eq!(normalize(None), Value::Null);
    }

    #[test]
    fn text_value_reads_segments() {
        let cell = json!([{ "text": "owner/" }, { "text": "repo" }]);
        assert_eq!(text_value(Some(&cell)).as_deref(), Some("owner/repo"));
        assert_eq!(text_value(Some(&json!(5))), None);
    }
}
