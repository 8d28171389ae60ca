//! Missing-key detection between the canonical tree and a target locale
//!
//! Only the canonical tree's keys are walked, so keys that exist solely in the
//! target are never reported. Every reported path addresses a leaf of the
//! canonical tree: when a whole namespace is missing its leaves are listed one
//! by one, which lets the merge step patch at leaf granularity.

use serde_json::Value;

use crate::tree::{Messages, collect_leaves, join_path};

/// Dot paths present in `canonical` that are missing or unusable in `target`.
///
/// A canonical leaf is reported when the target value is absent, `null`, an
/// empty string, or of a different JSON type. An empty target string is
/// reported even when a sibling is absent too: `{a:{b:""}}` against
/// `{a:{b:"x",c:"y"}}` yields `a.b` and `a.c`. A canonical namespace whose
/// target counterpart is absent or not an object is reported leaf by leaf.
///
/// Empty or null canonical leaves compared against the same value are not
/// reported, so a tree is never missing keys relative to itself.
///
/// The two mismatch cases are not symmetric: a leaf standing where a
/// namespace belongs yields every canonical leaf beneath it, while a scalar of
/// the wrong type yields a single path.
pub fn missing_keys(canonical: &Messages, target: &Messages) -> Vec<String> {
    let mut missing = Vec::new();
    walk(canonical, Some(target), "", &mut missing);
    missing
}

fn walk(canonical: &Messages, target: Option<&Messages>, prefix: &str, out: &mut Vec<String>) {
    for (key, source) in canonical {
        let path = join_path(prefix, key);
        let existing = target.and_then(|t| t.get(key));

        match (source, existing) {
            (Value::Object(child), Some(Value::Object(existing_child))) => {
                walk(child, Some(existing_child), &path, out);
            }
            // Absent, or a leaf where a namespace belongs: expand to leaves.
            (Value::Object(child), _) => collect_leaves(child, &path, out),
            (_, None) => out.push(path),
            (source, Some(existing)) => {
                if is_unusable(source, existing) {
                    out.push(path);
                }
            }
        }
    }
}

fn is_unusable(source: &Value, existing: &Value) -> bool {
    match (source, existing) {
        (Value::Null, Value::Null) => false,
        (_, Value::Null) => true,
        (Value::String(s), Value::String(e)) => e.is_empty() && !s.is_empty(),
        _ => std::mem::discriminant(source) != std::mem::discriminant(existing),
    }
}

/// Union of several missing-key lists, first occurrence wins the position.
pub fn union_keys<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Vec<String>>,
{
    let mut seen = std::collections::HashSet::new();
    let mut union = Vec::new();
    for key in lists.into_iter().flatten() {
        if seen.insert(key.as_str()) {
            union.push(key.clone());
        }
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{get_path, leaf_keys};
    use serde_json::json;

    fn tree(value: Value) -> Messages {
        value.as_object().cloned().unwrap()
    }

    fn samples() -> Vec<Messages> {
        vec![
            tree(json!({})),
            tree(json!({ "a": "x" })),
            tree(json!({ "a": { "b": "x", "c": "y" } })),
            tree(json!({ "a": "", "b": null, "c": 3, "d": true, "e": [1, 2] })),
            tree(json!({ "a": { "b": { "c": { "d": "deep" } }, "e": {} }, "f": "g" })),
            tree(json!({ "nav": { "home": "Home" }, "footer": { "links": { "x": "X" } } })),
        ]
    }

    #[test]
    fn test_tree_is_never_missing_keys_against_itself() {
        for sample in samples() {
            assert_eq!(missing_keys(&sample, &sample), Vec::<String>::new());
        }
    }

    #[test]
    fn test_every_reported_path_is_a_canonical_leaf() {
        let samples = samples();
        for canonical in &samples {
            for target in &samples {
                for path in missing_keys(canonical, target) {
                    let value = get_path(canonical, &path)
                        .unwrap_or_else(|| panic!("{path} does not resolve"));
                    assert!(!value.is_object(), "{path} is a namespace");
                }
            }
        }
    }

    #[test]
    fn test_empty_sibling_reported_only_when_missing() {
        let canonical = tree(json!({ "a": { "b": "x", "c": "y" } }));
        let target = tree(json!({ "a": { "b": "" } }));
        // b is present but empty, c is absent
        assert_eq!(missing_keys(&canonical, &target), vec!["a.b", "a.c"]);
    }

    #[test]
    fn test_present_sibling_is_not_reported() {
        let canonical = tree(json!({ "a": { "b": "x", "c": "y" } }));
        let target = tree(json!({ "a": { "b": "déjà" } }));
        assert_eq!(missing_keys(&canonical, &target), vec!["a.c"]);
    }

    #[test]
    fn test_missing_namespace_expands_to_leaves() {
        let canonical = tree(json!({ "a": { "b": "x" } }));
        let target = tree(json!({}));
        assert_eq!(missing_keys(&canonical, &target), vec!["a.b"]);
    }

    #[test]
    fn test_leaf_in_place_of_namespace_expands_to_leaves() {
        let canonical = tree(json!({ "a": { "b": "x", "c": { "d": "y" } } }));
        let target = tree(json!({ "a": "flattened" }));
        assert_eq!(missing_keys(&canonical, &target), vec!["a.b", "a.c.d"]);
    }

    #[test]
    fn test_null_and_type_mismatch_reported() {
        let canonical = tree(json!({ "a": "x", "b": "y", "c": 1, "d": 2.5 }));
        let target = tree(json!({ "a": null, "b": 7, "c": "one", "d": 3 }));
        assert_eq!(missing_keys(&canonical, &target), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_target_only_keys_ignored() {
        let canonical = tree(json!({ "a": "x" }));
        let target = tree(json!({ "a": "x", "legacy": { "old": "value" } }));
        assert!(missing_keys(&canonical, &target).is_empty());
    }

    #[test]
    fn test_empty_target_reports_every_leaf() {
        let canonical = tree(json!({ "nav": { "home": "Home", "blog": "Blog" }, "title": "T" }));
        assert_eq!(
            missing_keys(&canonical, &Messages::new()),
            leaf_keys(&canonical)
        );
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        let fr = vec!["a".to_string(), "c".to_string()];
        let ja = vec!["b".to_string(), "a".to_string(), "d".to_string()];
        assert_eq!(union_keys([&fr, &ja]), vec!["a", "c", "b", "d"]);
    }
}
