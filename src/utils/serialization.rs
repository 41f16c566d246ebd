// src/utils/serialization.rs
//! Serialization utilities for credential payloads.
//!
//! Provides:
//! - Canonical JSON encoding (sorted keys, compact) used for fingerprinting
//! - Plain JSON helpers for wire payloads
//!
//! Canonical output never depends on map iteration order, so a payload that is
//! rebuilt with its keys in a different order hashes to the same fingerprint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializes a value to a JSON string.
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Deserializes a value from a JSON string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Encodes a JSON value canonically.
///
/// Object keys are sorted by their UTF-8 bytes at every depth, arrays keep their
/// order, and no whitespace is emitted. Scalars use serde_json's own encoding.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

/// Serializes `data` through `serde_json::Value` and encodes it canonically.
pub fn canonicalize<T: Serialize>(data: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(data)?;
    Ok(canonical_bytes(&value))
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_scalar(&Value::String(key.clone()), out);
                out.push(b':');
                write_canonical(item, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        scalar => write_scalar(scalar, out),
    }
}

fn write_scalar(value: &Value, out: &mut Vec<u8>) {
    // Writing a scalar Value into a Vec cannot fail.
    if serde_json::to_writer(&mut *out, value).is_err() {
        out.extend_from_slice(b"null");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn keys_are_sorted_at_every_level() {
        let value = json!({
            "year": "2025",
            "fields": {"roll_number": "42", "board_name": "CBSE"},
            "name": "Alice"
        });
        assert_eq!(
            String::from_utf8(canonical_bytes(&value)).unwrap(),
            r#"{"fields":{"board_name":"CBSE","roll_number":"42"},"name":"Alice","year":"2025"}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut a = Map::new();
        a.insert("type".into(), json!("Passport"));
        a.insert("name".into(), json!("Alice"));
        let mut b = Map::new();
        b.insert("name".into(), json!("Alice"));
        b.insert("type".into(), json!("Passport"));
        assert_eq!(
            canonical_bytes(&Value::Object(a)),
            canonical_bytes(&Value::Object(b))
        );
    }

    #[test]
    fn arrays_keep_order_and_strings_are_escaped() {
        let value = json!({"list": [3, "a\"b", null, true], "unicode": "é"});
        assert_eq!(
            String::from_utf8(canonical_bytes(&value)).unwrap(),
            "{\"list\":[3,\"a\\\"b\",null,true],\"unicode\":\"é\"}"
        );
    }

    #[test]
    fn whitespace_in_source_is_irrelevant() {
        let pretty: Value = deserialize("{\n  \"b\" : 1,\n  \"a\" : [ 1 , 2 ]\n}").unwrap();
        let compact: Value = deserialize(r#"{"a":[1,2],"b":1}"#).unwrap();
        assert_eq!(canonical_bytes(&pretty), canonical_bytes(&compact));
    }
}
