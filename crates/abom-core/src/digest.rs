//! Canonical JSON and SHA-256 digests for manifests echoed in reports.
//!
//! Keys are sorted by UTF-16 code units (RFC 8785 §3.2.3) and integer-valued
//! floats are written as integers, so two manifests that differ only in key
//! order or `1` vs `1.0` share a digest.

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

/// -2^63, exactly representable.
const I64_MIN_F64: f64 = -9.223372036854775808e18;
/// 2^63. `i64::MAX as f64` rounds up to this value, which does not fit.
const I64_MAX_EXCLUSIVE_F64: f64 = 9.223372036854775808e18;

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Number(n) => match n.as_f64() {
            Some(f)
                if !n.is_i64()
                    && !n.is_u64()
                    && f.fract() == 0.0
                    && f >= I64_MIN_F64
                    && f < I64_MAX_EXCLUSIVE_F64 =>
            {
                Value::Number(Number::from(f as i64))
            }
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

/// Canonical compact JSON text of `value`.
///
/// `serde_json::Map` keeps insertion order only with the `preserve_order`
/// feature; without it the map is a `BTreeMap` and orders keys by UTF-8 bytes,
/// which agrees with UTF-16 order for every key outside the supplementary
/// planes.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Hex SHA-256 of the canonical JSON of `value`.
pub fn compute_digest(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_change_digest() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"x":3,"y":2},"b":1}"#).unwrap();
        assert_eq!(compute_digest(&a), compute_digest(&b));
    }

    #[test]
    fn test_integer_valued_float() {
        assert_eq!(canonical_json(&json!({ "value": 1.0 })), r#"{"value":1}"#);
        assert_eq!(canonical_json(&json!({ "value": 1.5 })), r#"{"value":1.5}"#);
    }

    #[test]
    fn test_float_at_i64_boundary_is_not_saturated() {
        let two_pow_63 = json!(9.223372036854775808e18);
        assert_ne!(canonical_json(&two_pow_63), i64::MAX.to_string());
        assert_eq!(canonical_json(&two_pow_63), two_pow_63.to_string());

        let below = json!(-9.223372036854775808e18);
        assert_eq!(canonical_json(&below), i64::MIN.to_string());
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = compute_digest(&json!({}));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
