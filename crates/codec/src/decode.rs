//! Hardened decode from untrusted wire JSON to an inspectable tree.
//!
//! The decoder trusts nothing about its input: it may be fed payloads that
//! never went through this crate's encoder. It never fails, never recurses
//! unboundedly, and drops forbidden keys on its own, independent of the
//! encoder's filtering. Reconstructed containers are fresh maps built by
//! key-by-key insertion; no shared structure in the receiving process can be
//! reached through them.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::encode::is_forbidden_key;

// Recursion cap for hostile, arbitrarily nested payloads. Anything legit is
// far shallower because the encoder enforces its own depth budget.
const MAX_DEPTH: usize = 128;

/// A decoded value: a finite, acyclic, display-ready tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Symbol(String),
    BigInt(String),
    /// A sequence. `total` is the sender-declared length; when it exceeds
    /// `items.len()` the tail was truncated at encode time.
    Seq { items: Vec<Decoded>, total: u64 },
    Obj {
        class: Option<String>,
        fields: IndexMap<String, Decoded>,
        dropped: u64,
    },
    Map {
        entries: Vec<(Decoded, Decoded)>,
        dropped: u64,
    },
    Set { items: Vec<Decoded>, dropped: u64 },
    /// Display-only stub; never invocable.
    Function { name: String },
    Error {
        name: String,
        message: String,
        stack: Option<String>,
    },
    Date { iso: String },
    Regexp { source: String, flags: String },
    /// A branch the encoder did not traverse; `total` members existed.
    Truncated { total: u64 },
    /// Inert placeholder for a back-reference; the shared target is not
    /// reconstructed.
    Circular { index: u32 },
    /// A tag this decoder does not understand.
    Unrecognized { kind: String },
}

/// Decode one wire value. Total: any input yields a `Decoded`.
pub fn decode(wire: &Json) -> Decoded {
    decode_value(wire, MAX_DEPTH)
}

fn decode_value(wire: &Json, depth_left: usize) -> Decoded {
    if depth_left == 0 {
        return Decoded::Truncated { total: 0 };
    }
    match wire {
        Json::Null => Decoded::Null,
        Json::Bool(b) => Decoded::Bool(*b),
        Json::Number(n) => Decoded::Num(n.as_f64().unwrap_or(0.0)),
        Json::String(s) => Decoded::Str(s.clone()),
        // Bare arrays arrive from senders that skipped the tagged encoding.
        Json::Array(items) => Decoded::Seq {
            total: items.len() as u64,
            items: items
                .iter()
                .map(|item| decode_value(item, depth_left - 1))
                .collect(),
        },
        Json::Object(map) => match map.get("kind").and_then(Json::as_str) {
            Some(kind) => decode_tagged(kind, map, depth_left),
            // Untagged foreign object: rebuild it as a plain keyed container,
            // still filtering hostile keys.
            None => Decoded::Obj {
                class: None,
                fields: map
                    .iter()
                    .filter(|(key, _)| !is_forbidden_key(key))
                    .map(|(key, val)| (key.clone(), decode_value(val, depth_left - 1)))
                    .collect(),
                dropped: 0,
            },
        },
    }
}

fn decode_tagged(kind: &str, map: &serde_json::Map<String, Json>, depth_left: usize) -> Decoded {
    let unrecognized = || Decoded::Unrecognized {
        kind: kind.to_string(),
    };
    match kind {
        "undefined" => Decoded::Undefined,
        "null" => Decoded::Null,
        "bool" => match map.get("value").and_then(Json::as_bool) {
            Some(b) => Decoded::Bool(b),
            None => unrecognized(),
        },
        "num" => match map.get("value").and_then(Json::as_f64) {
            Some(n) => Decoded::Num(n),
            None => unrecognized(),
        },
        "str" => match map.get("value").and_then(Json::as_str) {
            Some(s) => Decoded::Str(s.to_string()),
            None => unrecognized(),
        },
        "nan" => Decoded::Num(f64::NAN),
        "infinity" => {
            if map.get("negative").and_then(Json::as_bool).unwrap_or(false) {
                Decoded::Num(f64::NEG_INFINITY)
            } else {
                Decoded::Num(f64::INFINITY)
            }
        }
        "symbol" => Decoded::Symbol(
            map.get("description")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        "bigint" => match map.get("digits").and_then(Json::as_str) {
            Some(digits) if valid_digits(digits) => Decoded::BigInt(digits.to_string()),
            _ => unrecognized(),
        },
        "seq" => {
            let items = decode_items(map.get("items"), depth_left);
            Decoded::Seq {
                total: items.len() as u64,
                items,
            }
        }
        "truncated" => {
            let items = decode_items(map.get("items"), depth_left);
            let total = map
                .get("total")
                .and_then(Json::as_u64)
                .unwrap_or(items.len() as u64);
            if items.is_empty() {
                Decoded::Truncated { total }
            } else {
                Decoded::Seq { items, total }
            }
        }
        "obj" => {
            let mut fields = IndexMap::new();
            if let Some(entries) = map.get("entries").and_then(Json::as_array) {
                for entry in entries {
                    let Some(pair) = entry.as_array() else { continue };
                    let Some(key) = pair.first().and_then(Json::as_str) else {
                        continue;
                    };
                    if is_forbidden_key(key) {
                        continue;
                    }
                    let value = pair.get(1).map_or(Decoded::Undefined, |v| {
                        decode_value(v, depth_left - 1)
                    });
                    fields.insert(key.to_string(), value);
                }
            }
            Decoded::Obj {
                class: map
                    .get("class")
                    .and_then(Json::as_str)
                    .map(|s| s.to_string()),
                fields,
                dropped: map.get("dropped").and_then(Json::as_u64).unwrap_or(0),
            }
        }
        "map" => {
            let mut out = Vec::new();
            if let Some(entries) = map.get("entries").and_then(Json::as_array) {
                for entry in entries {
                    let Some(pair) = entry.as_array() else { continue };
                    let key = pair.first().map_or(Decoded::Undefined, |k| {
                        decode_value(k, depth_left - 1)
                    });
                    let value = pair.get(1).map_or(Decoded::Undefined, |v| {
                        decode_value(v, depth_left - 1)
                    });
                    out.push((key, value));
                }
            }
            Decoded::Map {
                entries: out,
                dropped: map.get("dropped").and_then(Json::as_u64).unwrap_or(0),
            }
        }
        "set" => Decoded::Set {
            items: decode_items(map.get("items"), depth_left),
            dropped: map.get("dropped").and_then(Json::as_u64).unwrap_or(0),
        },
        "func" => Decoded::Function {
            name: map
                .get("name")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "err" => Decoded::Error {
            name: map
                .get("name")
                .and_then(Json::as_str)
                .unwrap_or("Error")
                .to_string(),
            message: map
                .get("message")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            stack: map
                .get("stack")
                .and_then(Json::as_str)
                .map(|s| s.to_string()),
        },
        "date" => match map.get("iso").and_then(Json::as_str) {
            Some(iso) if chrono::DateTime::parse_from_rfc3339(iso).is_ok() => Decoded::Date {
                iso: iso.to_string(),
            },
            Some(iso) => Decoded::Str(iso.to_string()),
            None => unrecognized(),
        },
        "regexp" => Decoded::Regexp {
            source: map
                .get("source")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            flags: map
                .get("flags")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "cycle" => match map
            .get("index")
            .and_then(Json::as_u64)
            .and_then(|n| u32::try_from(n).ok())
        {
            Some(index) => Decoded::Circular { index },
            None => unrecognized(),
        },
        _ => unrecognized(),
    }
}

fn decode_items(items: Option<&Json>, depth_left: usize) -> Vec<Decoded> {
    items
        .and_then(Json::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| decode_value(item, depth_left - 1))
                .collect()
        })
        .unwrap_or_default()
}

fn valid_digits(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl Decoded {
    /// Declared size of a truncated branch, if this node is one.
    pub fn truncated_total(&self) -> Option<u64> {
        match self {
            Decoded::Truncated { total } => Some(*total),
            Decoded::Seq { items, total } if *total > items.len() as u64 => Some(*total),
            _ => None,
        }
    }
}

// Compact single-line form for sinks without a tree renderer.
impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoded::Undefined => write!(f, "undefined"),
            Decoded::Null => write!(f, "null"),
            Decoded::Bool(b) => write!(f, "{b}"),
            Decoded::Num(n) if n.is_nan() => write!(f, "NaN"),
            Decoded::Num(n) if n.is_infinite() && *n > 0.0 => write!(f, "Infinity"),
            Decoded::Num(n) if n.is_infinite() => write!(f, "-Infinity"),
            Decoded::Num(n) => write!(f, "{n}"),
            Decoded::Str(s) => write!(f, "{s}"),
            Decoded::Symbol(d) => write!(f, "Symbol({d})"),
            Decoded::BigInt(d) => write!(f, "{d}n"),
            Decoded::Seq { items, total } => {
                let joined = join(items.iter());
                if *total > items.len() as u64 {
                    write!(f, "({total}) [{joined}, …]")
                } else {
                    write!(f, "[{joined}]")
                }
            }
            Decoded::Obj {
                class,
                fields,
                dropped,
            } => {
                if let Some(class) = class {
                    write!(f, "{class} ")?;
                }
                let joined = fields
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                if *dropped > 0 {
                    write!(f, "{{ {joined}, … }}")
                } else {
                    write!(f, "{{ {joined} }}")
                }
            }
            Decoded::Map { entries, dropped } => {
                let joined = entries
                    .iter()
                    .map(|(k, v)| format!("{k} => {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Map({}) {{ {joined} }}", entries.len() as u64 + dropped)
            }
            Decoded::Set { items, dropped } => {
                write!(
                    f,
                    "Set({}) {{ {} }}",
                    items.len() as u64 + dropped,
                    join(items.iter())
                )
            }
            Decoded::Function { name } if name.is_empty() => write!(f, "[Function (anonymous)]"),
            Decoded::Function { name } => write!(f, "[Function: {name}]"),
            Decoded::Error { name, message, .. } => write!(f, "{name}: {message}"),
            Decoded::Date { iso } => write!(f, "{iso}"),
            Decoded::Regexp { source, flags } => write!(f, "/{source}/{flags}"),
            Decoded::Truncated { total } => write!(f, "({total}) …"),
            Decoded::Circular { .. } => write!(f, "[Circular]"),
            Decoded::Unrecognized { kind } => write!(f, "[Unrecognized: {kind}]"),
        }
    }
}

fn join<'a>(items: impl Iterator<Item = &'a Decoded>) -> String {
    items
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, Limits};
    use crate::value::Value;
    use serde_json::json;

    fn round_trip(value: &Value) -> Decoded {
        let encoded = encode(value, Limits::default());
        decode(&serde_json::to_value(&encoded).unwrap())
    }

    #[test]
    fn test_round_trip_plain_structures() {
        let value = Value::object([
            ("n", Value::from(1)),
            (
                "list",
                Value::array([Value::from(1), Value::from("two"), Value::Bool(true), Value::Null]),
            ),
            ("nested", Value::object([("x", Value::from("y"))])),
        ]);
        let decoded = round_trip(&value);
        let expected = Decoded::Obj {
            class: None,
            fields: IndexMap::from([
                ("n".to_string(), Decoded::Num(1.0)),
                (
                    "list".to_string(),
                    Decoded::Seq {
                        items: vec![
                            Decoded::Num(1.0),
                            Decoded::Str("two".to_string()),
                            Decoded::Bool(true),
                            Decoded::Null,
                        ],
                        total: 4,
                    },
                ),
                (
                    "nested".to_string(),
                    Decoded::Obj {
                        class: None,
                        fields: IndexMap::from([("x".to_string(), Decoded::Str("y".to_string()))]),
                        dropped: 0,
                    },
                ),
            ]),
            dropped: 0,
        };
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_nan_round_trip_is_not_the_string() {
        let decoded = round_trip(&Value::Num(f64::NAN));
        assert!(matches!(decoded, Decoded::Num(n) if n.is_nan()));
        assert_eq!(
            round_trip(&Value::from("NaN")),
            Decoded::Str("NaN".to_string())
        );
        assert_eq!(
            round_trip(&Value::Num(f64::NEG_INFINITY)),
            Decoded::Num(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_fabricated_forbidden_keys_are_rejected() {
        // A payload that never went through our encoder.
        let wire = json!({
            "kind": "obj",
            "class": null,
            "entries": [
                ["__proto__", {"kind": "obj", "class": null, "entries": [["isAdmin", {"kind": "bool", "value": true}]], "dropped": 0}],
                ["constructor", {"kind": "str", "value": "x"}],
                ["prototype", {"kind": "str", "value": "y"}],
                ["safe", {"kind": "str", "value": "value"}]
            ],
            "dropped": 0
        });
        match decode(&wire) {
            Decoded::Obj { fields, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields["safe"], Decoded::Str("value".to_string()));
                assert!(!fields.contains_key("__proto__"));
                assert!(!fields.contains_key("constructor"));
                assert!(!fields.contains_key("prototype"));
            }
            other => panic!("expected obj, got {other:?}"),
        }
    }

    #[test]
    fn test_untagged_foreign_object_is_filtered_too() {
        let wire = json!({"__proto__": {"isAdmin": true}, "ok": 2});
        match decode(&wire) {
            Decoded::Obj { fields, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields["ok"], Decoded::Num(2.0));
            }
            other => panic!("expected obj, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_becomes_placeholder() {
        let wire = json!({"kind": "gadget", "payload": 1});
        assert_eq!(
            decode(&wire),
            Decoded::Unrecognized {
                kind: "gadget".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_fields_become_placeholders() {
        assert_eq!(
            decode(&json!({"kind": "bool"})),
            Decoded::Unrecognized {
                kind: "bool".to_string()
            }
        );
        assert_eq!(
            decode(&json!({"kind": "bigint", "digits": "12x4"})),
            Decoded::Unrecognized {
                kind: "bigint".to_string()
            }
        );
        assert_eq!(
            decode(&json!({"kind": "bigint", "digits": "-124"})),
            Decoded::BigInt("-124".to_string())
        );
        assert_eq!(
            decode(&json!({"kind": "cycle", "index": "seven"})),
            Decoded::Unrecognized {
                kind: "cycle".to_string()
            }
        );
    }

    #[test]
    fn test_truncated_markers_decode() {
        let bare = json!({"kind": "truncated", "total": 42, "items": []});
        assert_eq!(decode(&bare), Decoded::Truncated { total: 42 });
        assert_eq!(decode(&bare).truncated_total(), Some(42));

        let with_prefix = json!({
            "kind": "truncated",
            "total": 100000,
            "items": [{"kind": "num", "value": 0.0}]
        });
        match decode(&with_prefix) {
            Decoded::Seq { items, total } => {
                assert_eq!(total, 100_000);
                assert_eq!(items, vec![Decoded::Num(0.0)]);
            }
            other => panic!("expected seq, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_decodes_to_inert_placeholder() {
        let value = Value::object([("name", Value::from("loop"))]);
        if let Value::Object(handle) = &value {
            handle.write().fields.insert("own".to_string(), value.clone());
        }
        match round_trip(&value) {
            Decoded::Obj { fields, .. } => {
                assert_eq!(fields["own"], Decoded::Circular { index: 0 });
            }
            other => panic!("expected obj, got {other:?}"),
        }
    }

    #[test]
    fn test_function_stub_is_display_only() {
        let decoded = round_trip(&Value::function("handler"));
        assert_eq!(
            decoded,
            Decoded::Function {
                name: "handler".to_string()
            }
        );
        assert_eq!(decoded.to_string(), "[Function: handler]");
    }

    #[test]
    fn test_invalid_date_falls_back_to_text() {
        let wire = json!({"kind": "date", "iso": "not-a-date"});
        assert_eq!(decode(&wire), Decoded::Str("not-a-date".to_string()));
        let wire = json!({"kind": "date", "iso": "2024-05-01T12:00:00.000Z"});
        assert_eq!(
            decode(&wire),
            Decoded::Date {
                iso: "2024-05-01T12:00:00.000Z".to_string()
            }
        );
    }

    #[test]
    fn test_hostile_nesting_is_bounded() {
        let mut wire = json!({"kind": "seq", "items": []});
        for _ in 0..2_000 {
            wire = json!({"kind": "seq", "items": [wire]});
        }
        // Must return, not blow the stack.
        let decoded = decode(&wire);
        assert!(matches!(decoded, Decoded::Seq { .. }));
    }

    #[test]
    fn test_display_forms() {
        let decoded = decode(&json!({
            "kind": "truncated",
            "total": 100000,
            "items": [{"kind": "num", "value": 0.0}, {"kind": "num", "value": 1.0}]
        }));
        assert_eq!(decoded.to_string(), "(100000) [0, 1, …]");
        assert_eq!(
            decode(&json!({"kind": "truncated", "total": 5, "items": []})).to_string(),
            "(5) …"
        );
        assert_eq!(
            decode(&json!({"kind": "cycle", "index": 0})).to_string(),
            "[Circular]"
        );
    }
}
