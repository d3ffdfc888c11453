//! Record codec: flat key/value records ⇄ one delimited text blob.
//!
//! # Grammar
//! One record per line; `field=value` pairs joined by `;`.  Values carry no
//! type tag — the reader sniffs the shape, in this order:
//!
//! 1. `null` / `undefined`          → [`Value::Null`]
//! 2. `true` / `false`              → [`Value::Bool`]
//! 3. parses fully as a number      → [`Value::Number`]
//! 4. `[`…`]` valid JSON array      → [`Value::Links`] when every element is
//!    a string containing `:`, else [`Value::Array`]
//! 5. `{`…`}` valid JSON object     → [`Value::Object`]
//! 6. one `:`, no spaces            → [`Value::Link`]
//! 7. anything else                 → [`Value::Text`]
//!
//! # Known ambiguity
//! The sniffing is lossy by design: the *text* `"true"` is indistinguishable
//! from the boolean, `"3:4"`-shaped free text reads back as a link, and a
//! text value containing `;`, `=` or a newline breaks the framing.  Rust's
//! float parser also accepts `inf`, `infinity` and `NaN` (any case), so
//! those words come back as [`Value::Number`] rather than text.  Callers
//! must keep free-text fields away from the reserved tokens; the codec does
//! not try to paper over this.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::link::Link;

// ── Value ────────────────────────────────────────────────────────────────────

/// A typed field value.  Generic JSON legs reuse `serde_json` containers;
/// link values get first-class variants so resolution never re-sniffs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Array(Vec<serde_json::Value>),
    Object(serde_json::Map<String, serde_json::Value>),
    Link(Link),
    Links(Vec<Link>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Value::Link(l) => Some(l),
            _ => None,
        }
    }

    /// Link-array view.  An empty JSON array is accepted too: `[]` carries
    /// no element to sniff, so it deserializes as a generic array even when
    /// it was written from an empty link list.
    pub fn as_links(&self) -> Option<Vec<Link>> {
        match self {
            Value::Links(ls) => Some(ls.clone()),
            Value::Array(items) if items.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }
}

/// JSON projection for diagnostics and the CLI dump.  Link values
/// serialize as their `collection:id` strings, so the output mirrors what
/// the stored grammar would show.
impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            // Whole numbers print without a trailing `.0`, like the stored form.
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Array(items) => items.serialize(serializer),
            Value::Object(map) => map.serialize(serializer),
            Value::Link(l) => l.serialize(serializer),
            Value::Links(ls) => ls.serialize(serializer),
        }
    }
}

/// One flat record: field name → typed value.
pub type Record = BTreeMap<String, Value>;

// ── Serialize ────────────────────────────────────────────────────────────────

fn serialize_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Text(s) => s.clone(),
        Value::Link(l) => l.to_string(),
        Value::Links(ls) => serde_json::Value::Array(
            ls.iter().map(|l| serde_json::Value::String(l.to_string())).collect(),
        )
        .to_string(),
        Value::Array(items) => serde_json::Value::Array(items.clone()).to_string(),
        Value::Object(map) => serde_json::Value::Object(map.clone()).to_string(),
    }
}

/// Serialize a record list to the delimited text form.
///
/// Record order is preserved; an empty list serializes to the empty string.
pub fn serialize_records(records: &[Record]) -> String {
    records
        .iter()
        .map(|record| {
            record
                .iter()
                .map(|(field, value)| format!("{field}={}", serialize_value(value)))
                .collect::<Vec<_>>()
                .join(";")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Deserialize ──────────────────────────────────────────────────────────────

fn convert_value(raw: &str) -> Value {
    match raw {
        "null" | "undefined" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if !raw.is_empty() {
        if let Ok(n) = raw.parse::<f64>() {
            return Value::Number(n);
        }
    }

    if raw.starts_with('[') && raw.ends_with(']') {
        return match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(items)) => {
                let all_link_shaped = !items.is_empty()
                    && items.iter().all(
                        |v| matches!(v, serde_json::Value::String(s) if s.contains(':')),
                    );
                if all_link_shaped {
                    let links = items
                        .iter()
                        .filter_map(|v| v.as_str())
                        .filter_map(Link::parse)
                        .collect();
                    Value::Links(links)
                } else {
                    Value::Array(items)
                }
            }
            _ => Value::Text(raw.to_string()),
        };
    }

    if raw.starts_with('{') && raw.ends_with('}') {
        return match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Object(map)) => Value::Object(map),
            _ => Value::Text(raw.to_string()),
        };
    }

    if raw.contains(':') && !raw.contains(' ') && raw.split(':').count() == 2 {
        if let Some(link) = Link::parse(raw) {
            return Value::Link(link);
        }
    }

    Value::Text(raw.to_string())
}

fn parse_record(line: &str) -> Record {
    let mut record = Record::new();
    for pair in line.split(';') {
        if pair.trim().is_empty() {
            continue;
        }
        let (field, value) = pair.split_once('=').unwrap_or((pair, ""));
        record.insert(field.trim().to_string(), convert_value(value.trim()));
    }
    record
}

/// Parse the delimited text form back into records.
///
/// Total over all inputs: unrecognized value shapes land in
/// [`Value::Text`], never an error.  Blank input yields an empty list;
/// blank lines and empty `;` segments are skipped.
pub fn deserialize_records(text: &str) -> Vec<Record> {
    text.trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_record)
        .collect()
}
