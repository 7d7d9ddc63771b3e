//! Entry-level encode/decode on top of the value codec.

use common::{CaptureResult, LogEntry, Method};
use serde_json::Value as Json;

use crate::decode::{decode, Decoded};
use crate::encode::{encode, Limits};
use crate::value::Value;
use crate::wire::Encoded;

/// Encode every argument of a raw entry for transport.
pub fn encode_entry(entry: &LogEntry<Value>, limits: Limits) -> LogEntry<Encoded> {
    LogEntry::new(
        entry.method,
        entry.id.clone(),
        entry.data.iter().map(|value| encode(value, limits)).collect(),
    )
}

/// Serialize a transport entry to a JSON string.
pub fn entry_json(entry: &LogEntry<Encoded>) -> CaptureResult<String> {
    Ok(serde_json::to_string(entry)?)
}

/// Decode one entry from untrusted wire JSON.
///
/// Total: a malformed payload yields an empty `log` entry rather than an
/// error, and unknown method names fall back to `log`.
pub fn decode_entry(wire: &Json) -> LogEntry<Decoded> {
    let method = wire
        .get("method")
        .and_then(Json::as_str)
        .and_then(Method::parse)
        .unwrap_or(Method::Log);
    let id = wire
        .get("id")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string();
    let data = wire
        .get("data")
        .and_then(Json::as_array)
        .map(|items| items.iter().map(decode).collect())
        .unwrap_or_default();
    LogEntry::new(method, id, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_round_trip() {
        let entry = LogEntry::new(
            Method::Warn,
            "entry-3",
            vec![Value::from("careful"), Value::array([Value::from(1)])],
        );
        let encoded = encode_entry(&entry, Limits::default());
        let wire: Json = serde_json::from_str(&entry_json(&encoded).unwrap()).unwrap();
        let decoded = decode_entry(&wire);

        assert_eq!(decoded.method, Method::Warn);
        assert_eq!(decoded.id, "entry-3");
        assert_eq!(decoded.data[0], Decoded::Str("careful".to_string()));
        assert_eq!(
            decoded.data[1],
            Decoded::Seq {
                items: vec![Decoded::Num(1.0)],
                total: 1
            }
        );
    }

    #[test]
    fn test_unknown_method_falls_back_to_log() {
        let wire = json!({"method": "exfiltrate", "id": "x", "data": ["hi"]});
        let decoded = decode_entry(&wire);
        assert_eq!(decoded.method, Method::Log);
        assert_eq!(decoded.data[0], Decoded::Str("hi".to_string()));
    }

    #[test]
    fn test_malformed_entry_decodes_empty() {
        let decoded = decode_entry(&json!(["not", "an", "entry"]));
        assert_eq!(decoded.method, Method::Log);
        assert_eq!(decoded.id, "");
        assert!(decoded.data.is_empty());
    }
}
