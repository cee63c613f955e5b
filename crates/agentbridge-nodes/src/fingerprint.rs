use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Content-hash fingerprint of a JSON value. `serde_json::Value`'s `Map`
/// preserves insertion order by default, which is not stable across calls
/// that build the value from a `HashMap`; re-keying through a `BTreeMap`
/// first guarantees a canonical key order so two logically-equal values
/// fingerprint identically (spec §4.3 `is_data_changed`).
pub fn fingerprint(value: &serde_json::Value) -> u64 {
    let canonical = canonicalize(value);
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn canonicalize(value: &serde_json::Value) -> String {
    fn walk(value: &serde_json::Value, out: &mut String) {
        match value {
            serde_json::Value::Object(map) => {
                let sorted: BTreeMap<&String, &serde_json::Value> = map.iter().collect();
                out.push('{');
                for (k, v) in sorted {
                    out.push_str(k);
                    out.push(':');
                    walk(v, out);
                    out.push(',');
                }
                out.push('}');
            }
            serde_json::Value::Array(items) => {
                out.push('[');
                for v in items {
                    walk(v, out);
                    out.push(',');
                }
                out.push(']');
            }
            other => out.push_str(&other.to_string()),
        }
    }
    let mut out = String::new();
    walk(value, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_does_not_affect_fingerprint() {
        let a = serde_json::json!({"a": 1, "b": 2});
        let b = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn different_values_fingerprint_differently() {
        let a = serde_json::json!({"a": 1});
        let b = serde_json::json!({"a": 2});
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
