//! Data-path expressions (`$questions`, `$meta.items[0].text`) over task data.

use serde_json::Value;

/// Resolves a data path against the task data.
///
/// A leading `$` is optional. Segments are separated by `.`; array elements
/// can be addressed as `items[2]` or `items.2`. Returns `None` for anything
/// that does not exist.
pub fn resolve<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    let path = path.strip_prefix('$').unwrap_or(path);
    if path.is_empty() {
        return Some(data);
    }

    let mut current = data;
    for segment in split_segments(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Resolves a `$key` reference, returning the value as a string.
///
/// Values that do not start with `$` are literals and returned unchanged.
pub fn resolve_text(data: &Value, raw: &str) -> Option<String> {
    if !raw.starts_with('$') {
        return Some(raw.to_string());
    }
    match resolve(data, raw)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['.', '[', ']']).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_paths() {
        let data = json!({"meta": {"items": [{"text": "a"}, {"text": "b"}]}});
        assert_eq!(resolve(&data, "$meta.items[1].text"), Some(&json!("b")));
        assert_eq!(resolve(&data, "meta.items.0.text"), Some(&json!("a")));
        assert_eq!(resolve(&data, "$meta.missing"), None);
        assert_eq!(resolve(&data, "$meta.items[9]"), None);
    }

    #[test]
    fn bare_dollar_is_root() {
        let data = json!([1, 2]);
        assert_eq!(resolve(&data, "$"), Some(&data));
    }

    #[test]
    fn resolve_text_handles_literals_and_refs() {
        let data = json!({"image": "https://x/a.jpg", "n": 3});
        assert_eq!(
            resolve_text(&data, "$image").as_deref(),
            Some("https://x/a.jpg")
        );
        assert_eq!(resolve_text(&data, "$n").as_deref(), Some("3"));
        assert_eq!(resolve_text(&data, "plain").as_deref(), Some("plain"));
        assert_eq!(resolve_text(&data, "$nope"), None);
    }
}
