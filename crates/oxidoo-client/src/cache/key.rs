//! Deterministic cache-key derivation.
//!
//! A parameter array is canonicalized before hashing so that logically
//! identical calls map to the same key across processes:
//!
//! 1. every JSON object, at any depth, is rendered with its keys sorted;
//! 2. the top-level array's elements are sorted lexicographically by their
//!    canonical rendering - a total order that is well-defined even for
//!    mixed-type arrays;
//! 3. the sorted rendering is hashed with SHA-256 and returned as lowercase
//!    hex.
//!
//! Sorting by rendering gives a total order for mixed-type arrays: values
//! of different types are never compared directly, only their serialized
//! forms.

use std::fmt::Write as _;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Derive the cache key of a positional parameter array.
#[must_use]
pub fn derive_key(params: &[Value]) -> String {
    let mut rendered: Vec<String> = params.iter().map(canonical_json).collect();
    rendered.sort();

    let mut hasher = Sha256::new();
    hasher.update(b"[");
    for (index, element) in rendered.iter().enumerate() {
        if index > 0 {
            hasher.update(b",");
        }
        hasher.update(element.as_bytes());
    }
    hasher.update(b"]");
    format!("{:x}", hasher.finalize())
}

/// Render a value as canonical JSON: compact, object keys sorted.
fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        // Display for numbers and strings matches serde_json's compact
        // encoding, including string escaping.
        Value::Number(_) | Value::String(_) => {
            let _ = write!(out, "{value}");
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut names: Vec<&String> = map.keys().collect();
            names.sort();
            out.push('{');
            for (index, name) in names.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(&Value::String(name.clone()), out);
                out.push(':');
                if let Some(item) = map.get(name) {
                    write_canonical(item, out);
                }
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_same_input_same_key() {
        let params = vec![json!("prod"), json!(2), json!([["active", "=", true]])];
        assert_eq!(derive_key(&params), derive_key(&params));
    }

    #[test]
    fn test_key_is_stable_hex_sha256() {
        let key = derive_key(&[json!(1)]);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_permuted_arrays_canonicalize_to_the_same_key() {
        let params = vec![json!("prod"), json!(2), json!("secret")];
        let permuted = vec![json!(2), json!("secret"), json!("prod")];
        assert_eq!(derive_key(&params), derive_key(&permuted));
    }

    #[test]
    fn test_object_key_order_is_irrelevant() {
        let first = vec![json!({"lang": "en_US", "tz": "UTC"})];
        let second = vec![json!({"tz": "UTC", "lang": "en_US"})];
        assert_eq!(derive_key(&first), derive_key(&second));
    }

    #[test]
    fn test_different_params_produce_different_keys() {
        let search_ten = vec![json!("res.partner"), json!("search"), json!(10)];
        let search_twenty = vec![json!("res.partner"), json!("search"), json!(20)];
        assert_ne!(derive_key(&search_ten), derive_key(&search_twenty));
    }

    #[test]
    fn test_mixed_type_arrays_have_a_total_order() {
        // No panic, and stability across repeated calls.
        let params = vec![json!(null), json!(true), json!(1), json!("1"), json!([1]), json!({"a": 1})];
        assert_eq!(derive_key(&params), derive_key(&params));
    }

    #[test]
    fn test_nested_structures_hash_canonically() {
        let first = vec![json!([{"b": 2, "a": 1}])];
        let second = vec![json!([{"a": 1, "b": 2}])];
        assert_eq!(derive_key(&first), derive_key(&second));
    }
}
