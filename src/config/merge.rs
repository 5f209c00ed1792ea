//! Field-by-field merging of configuration tiers.
//!
//! Tiers are converted to `serde_json::Value` and folded lowest to highest.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value,
/// except `null`, which leaves the base untouched.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold tiers in order; later tiers win.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_merge_independently() {
        let defaults = json!({"server": {"host": "127.0.0.1", "port": 5000}});
        let project = json!({"server": {"port": 8080}});
        assert_eq!(
            deep_merge(defaults, project),
            json!({"server": {"host": "127.0.0.1", "port": 8080}})
        );
    }

    #[test]
    fn lists_are_replaced_not_appended() {
        let defaults = json!({"uploads": {"allowed_extensions": ["png", "jpg"]}});
        let user = json!({"uploads": {"allowed_extensions": ["webp"]}});
        assert_eq!(
            deep_merge(defaults, user),
            json!({"uploads": {"allowed_extensions": ["webp"]}})
        );
    }

    #[test]
    fn null_overlay_keeps_base() {
        let merged = deep_merge(
            json!({"calendar": {"default_view": "daily"}}),
            json!({"calendar": null}),
        );
        assert_eq!(merged, json!({"calendar": {"default_view": "daily"}}));
    }

    #[test]
    fn later_tiers_win() {
        let merged = deep_merge_all(vec![
            json!({"server": {"port": 1}}),
            json!({"server": {"port": 2}}),
            json!({"server": {"port": 3}}),
        ]);
        assert_eq!(merged, json!({"server": {"port": 3}}));
    }
}
