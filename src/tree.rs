//! Message trees and dot-notation paths
//!
//! A message tree is a JSON object whose values are either leaves (normally
//! strings) or nested trees acting as namespaces:
//!
//! ```json
//! { "footer": { "quickLinks": { "about": "About us" } } }
//! ```
//!
//! The leaf above is addressed as `footer.quickLinks.about`.

use serde_json::{Map, Value};

/// An ordered message tree. Key order follows the source file.
pub type Messages = Map<String, Value>;

/// Path separator used when flattening trees.
pub const PATH_SEPARATOR: char = '.';

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{PATH_SEPARATOR}{key}")
    }
}

/// Every leaf path of `tree`, depth first, in key order.
pub fn leaf_keys(tree: &Messages) -> Vec<String> {
    let mut keys = Vec::new();
    collect_leaves(tree, "", &mut keys);
    keys
}

pub(crate) fn collect_leaves(tree: &Messages, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in tree {
        let path = join_path(prefix, key);
        match value {
            Value::Object(child) => collect_leaves(child, &path, out),
            _ => out.push(path),
        }
    }
}

/// Look up the value at a dot path.
pub fn get_path<'a>(tree: &'a Messages, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(PATH_SEPARATOR);
    let first = segments.next()?;
    let mut current = tree.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at a dot path, creating intermediate trees.
///
/// An intermediate leaf standing where a namespace is needed is replaced by a
/// tree.
pub fn set_path(tree: &mut Messages, path: &str, value: Value) {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = tree;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(child) = entry else {
            return;
        };
        current = child;
    }
    current.insert(last.to_string(), value);
}

/// Build a sub-tree holding only the requested leaf paths.
///
/// Paths that do not resolve to a leaf in `tree` are skipped with a warning.
/// The nesting of `tree` is kept, so the result can be merged back.
pub fn extract_keys<S: AsRef<str>>(tree: &Messages, paths: &[S]) -> Messages {
    let mut out = Messages::new();
    for path in paths {
        let path = path.as_ref();
        match get_path(tree, path) {
            Some(Value::Object(_)) | None => {
                tracing::warn!(key = path, "key is not a leaf of the source tree, skipping");
            }
            Some(value) => set_path(&mut out, path, value.clone()),
        }
    }
    out
}

/// Number of leaves in a tree.
pub fn leaf_count(tree: &Messages) -> usize {
    tree.values()
        .map(|value| match value {
            Value::Object(child) => leaf_count(child),
            _ => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> Messages {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_leaf_keys_depth_first() {
        let messages = tree(json!({
            "siteInfo": { "brandName": "Edge", "tagline": "Hi" },
            "title": "Home",
            "footer": { "links": { "about": "About" } }
        }));
        assert_eq!(
            leaf_keys(&messages),
            vec![
                "siteInfo.brandName",
                "siteInfo.tagline",
                "title",
                "footer.links.about"
            ]
        );
    }

    #[test]
    fn test_get_path() {
        let messages = tree(json!({ "a": { "b": { "c": "x" } } }));
        assert_eq!(get_path(&messages, "a.b.c"), Some(&json!("x")));
        assert!(get_path(&messages, "a.b").unwrap().is_object());
        assert_eq!(get_path(&messages, "a.x"), None);
        assert_eq!(get_path(&messages, "a.b.c.d"), None);
    }

    #[test]
    fn test_set_path_creates_namespaces() {
        let mut messages = Messages::new();
        set_path(&mut messages, "a.b.c", json!("x"));
        set_path(&mut messages, "a.d", json!("y"));
        assert_eq!(Value::Object(messages), json!({ "a": { "b": { "c": "x" }, "d": "y" } }));
    }

    #[test]
    fn test_set_path_replaces_leaf_with_namespace() {
        let mut messages = tree(json!({ "a": "flat" }));
        set_path(&mut messages, "a.b", json!("x"));
        assert_eq!(Value::Object(messages), json!({ "a": { "b": "x" } }));
    }

    #[test]
    fn test_extract_keys_keeps_nesting() {
        let messages = tree(json!({
            "nav": { "home": "Home", "blog": "Blog" },
            "title": "Site"
        }));
        let extracted = extract_keys(&messages, &["nav.blog", "title", "nav.missing", "nav"]);
        assert_eq!(
            Value::Object(extracted),
            json!({ "nav": { "blog": "Blog" }, "title": "Site" })
        );
    }

    #[test]
    fn test_leaf_count() {
        let messages = tree(json!({ "a": { "b": "x", "c": { "d": "y" } }, "e": "z", "f": {} }));
        assert_eq!(leaf_count(&messages), 3);
    }
}
