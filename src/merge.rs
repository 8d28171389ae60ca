use serde_json::Value;

use crate::tree::Messages;

/// Merge a freshly translated partial tree into an existing one.
///
/// Keys of `partial` win, keys only in `existing` are kept, and namespaces
/// present on both sides are merged recursively so that a partial pass never
/// drops sibling keys. Values are copied as-is.
pub fn deep_merge(existing: &Messages, partial: &Messages) -> Messages {
    let mut merged = existing.clone();
    merge_into(&mut merged, partial);
    merged
}

/// In-place variant of [`deep_merge`].
pub fn merge_into(target: &mut Messages, partial: &Messages) {
    for (key, incoming) in partial {
        match (target.get_mut(key), incoming) {
            (Some(Value::Object(current)), Value::Object(incoming)) => {
                merge_into(current, incoming);
            }
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{get_path, leaf_keys};
    use serde_json::json;

    fn tree(value: Value) -> Messages {
        value.as_object().cloned().unwrap()
    }

    fn pairs() -> Vec<(Messages, Messages)> {
        vec![
            (tree(json!({})), tree(json!({ "a": "x" }))),
            (
                tree(json!({ "a": { "b": "old", "c": "keep" } })),
                tree(json!({ "a": { "b": "new" } })),
            ),
            (
                tree(json!({ "a": "flat", "z": 1 })),
                tree(json!({ "a": { "b": "nested" } })),
            ),
            (
                tree(json!({ "a": { "b": "x" } })),
                tree(json!({ "a": "replaced" })),
            ),
            (
                tree(json!({ "nav": { "home": "Accueil" }, "legacy": "v" })),
                tree(json!({ "nav": { "blog": "Blog" }, "footer": { "x": "y" } })),
            ),
        ]
    }

    #[test]
    fn test_merge_is_idempotent() {
        for (existing, partial) in pairs() {
            let once = deep_merge(&existing, &partial);
            let twice = deep_merge(&once, &partial);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_merge_adopts_every_partial_leaf() {
        for (existing, partial) in pairs() {
            let merged = deep_merge(&existing, &partial);
            for key in leaf_keys(&partial) {
                assert_eq!(get_path(&merged, &key), get_path(&partial, &key), "{key}");
            }
        }
    }

    #[test]
    fn test_merge_preserves_untouched_existing_leaves() {
        for (existing, partial) in pairs() {
            let merged = deep_merge(&existing, &partial);
            for key in leaf_keys(&existing) {
                let overwritten = key
                    .match_indices('.')
                    .map(|(i, _)| &key[..i])
                    .chain(std::iter::once(key.as_str()))
                    .any(|prefix| get_path(&partial, prefix).is_some_and(|v| !v.is_object()))
                    || get_path(&partial, &key).is_some();
                if !overwritten {
                    assert_eq!(get_path(&merged, &key), get_path(&existing, &key), "{key}");
                }
            }
        }
    }

    #[test]
    fn test_sibling_keys_survive_partial_pass() {
        let existing = tree(json!({ "a": { "b": "old", "c": "keep" }, "d": "keep" }));
        let partial = tree(json!({ "a": { "b": "new" } }));
        assert_eq!(
            Value::Object(deep_merge(&existing, &partial)),
            json!({ "a": { "b": "new", "c": "keep" }, "d": "keep" })
        );
    }

    #[test]
    fn test_merge_keeps_existing_key_order() {
        let existing = tree(json!({ "z": "1", "a": "2" }));
        let partial = tree(json!({ "m": "3", "z": "4" }));
        let merged = deep_merge(&existing, &partial);
        let keys: Vec<&String> = merged.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
