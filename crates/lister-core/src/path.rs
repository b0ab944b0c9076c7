//! Dotted/bracketed path lookup into JSON values
//!
//! Supports `a.b.c`, `a[0].b`, `a.0.b` and quoted keys (`a["x.y"]`).
//! An empty path resolves to the value itself.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// One step of a parsed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\[(\d+)\]|\[["']([^"']*)["']\]|([^.\[\]]+)"#)
            .expect("Invalid path segment regex pattern")
    })
}

/// Split a path into segments
pub fn segments(path: &str) -> Vec<Segment<'_>> {
    segment_re()
        .captures_iter(path)
        .filter_map(|caps| {
            if let Some(index) = caps.get(1) {
                index.as_str().parse().ok().map(Segment::Index)
            } else {
                caps.get(2)
                    .or_else(|| caps.get(3))
                    .map(|key| Segment::Key(key.as_str()))
            }
        })
        .collect()
}

/// Read the value at `path`, or `None` when any step is missing
pub fn get_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    segments(path)
        .into_iter()
        .try_fold(value, |current, segment| match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key),
            (Segment::Key(key), Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            (Segment::Index(i), Value::Array(items)) => items.get(i),
            (Segment::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segments_mixed() {
        assert_eq!(
            segments("a[0].b"),
            vec![Segment::Key("a"), Segment::Index(0), Segment::Key("b")]
        );
        assert_eq!(
            segments(r#"meta["x.y"]"#),
            vec![Segment::Key("meta"), Segment::Key("x.y")]
        );
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_get_path_nested() {
        let value = json!({"a": {"b": {"c": 7}}, "list": [{"id": 1}, {"id": 2}]});

        assert_eq!(get_path(&value, "a.b.c"), Some(&json!(7)));
        assert_eq!(get_path(&value, "list[1].id"), Some(&json!(2)));
        assert_eq!(get_path(&value, "list.0.id"), Some(&json!(1)));
        assert_eq!(get_path(&value, ""), Some(&value));
    }

    #[test]
    fn test_get_path_missing() {
        let value = json!({"a": [1, 2]});

        assert_eq!(get_path(&value, "a[5]"), None);
        assert_eq!(get_path(&value, "a.b"), None);
        assert_eq!(get_path(&value, "x.y.z"), None);
    }
}
