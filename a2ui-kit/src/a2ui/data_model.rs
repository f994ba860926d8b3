//! A2UI Data Model
//!
//! Per-surface hierarchical store addressed by slash-delimited paths. `merge`
//! is the only mutation primitive: maps merge key by key, everything else
//! replaces the node it lands on. Every effective write records the written
//! path and all of its ancestors so renderers can tell which reads went stale.

use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::error::{A2uiError, A2uiResult};
use super::message::DataContent;
use super::value::join_path;

/// A data store whose values are reachable via JSON Pointer style paths.
///
/// # Path Format
///
/// - `/` - root
/// - `/foo` - property "foo"
/// - `/foo/bar` - nested property
/// - `/items/0` - array element at index 0
/// - `/items/0/name` - property of array element
///
/// `~1` and `~0` inside a segment decode to `/` and `~`.
///
/// # Example
///
/// ```rust
/// use a2ui_kit::a2ui::DataModel;
/// use serde_json::json;
///
/// let mut model = DataModel::new();
/// model.merge("/user", json!({"name": "Alice"})).unwrap();
/// model.merge("/user", json!({"email": "alice@example.com"})).unwrap();
///
/// assert_eq!(model.get_string("/user/name"), Some("Alice"));
/// assert_eq!(model.get_string("/user/email"), Some("alice@example.com"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataModel {
    data: Value,

    /// Paths made stale since the last `take_changes`: written paths plus ancestors
    changes: BTreeSet<String>,

    /// The written paths alone; their descendants are stale too
    written: BTreeSet<String>,

    /// Bumped once per effective write
    version: u64,
}

impl Default for DataModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DataModel {
    /// Create a new empty data model
    pub fn new() -> Self {
        Self::with_data(Value::Object(Map::new()))
    }

    pub fn with_data(data: Value) -> Self {
        DataModel {
            data,
            changes: BTreeSet::new(),
            written: BTreeSet::new(),
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get the entire data as a Value
    pub fn as_value(&self) -> &Value {
        &self.data
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Node at `path`, `None` when nothing lives there.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, &parse_pointer(path))
    }

    /// Node at `path`, failing when the path cannot address anything.
    ///
    /// `Ok(None)` means a key or index along the way is absent, and a `null`
    /// node counts as absent. Stepping into any other scalar, or into an array
    /// with a segment that is not an index, is `InvalidPath`.
    pub fn try_get(&self, path: &str) -> A2uiResult<Option<&Value>> {
        try_lookup(&self.data, &parse_pointer(path), path)
    }

    pub fn get_string(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_number(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    pub fn get_array(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path).and_then(Value::as_array)
    }

    pub fn get_object(&self, path: &str) -> Option<&Map<String, Value>> {
        self.get(path).and_then(Value::as_object)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Merge `value` at `path` and return what was there before.
    ///
    /// Missing intermediate containers are created. Fails with `InvalidPath`,
    /// leaving the model untouched, when the path crosses a scalar or indexes
    /// beyond the end of an array.
    pub fn merge(&mut self, path: &str, value: Value) -> A2uiResult<Option<Value>> {
        let segments = parse_pointer(path);
        check_writable(&self.data, &segments, path)?;
        let prior = merge_at(&mut self.data, &segments, value, path)?;

        if prior.as_ref() != lookup(&self.data, &segments) {
            self.record_change(&segments);
            self.version += 1;
        }
        Ok(prior)
    }

    /// Apply all entries of a `dataModelUpdate` at `base` as one unit.
    ///
    /// Each entry merges at `base/key`. If any entry fails nothing is applied.
    /// Returns the written paths.
    pub fn apply_update(&mut self, base: &str, contents: &[DataContent]) -> A2uiResult<Vec<String>> {
        let mut staged = self.data.clone();
        let mut written = Vec::with_capacity(contents.len());

        for content in contents {
            let path = join_path(base, &escape_segment(&content.key));
            let segments = parse_pointer(&path);
            check_writable(&staged, &segments, &path)?;
            merge_at(&mut staged, &segments, content.value.to_json(), &path)?;
            written.push((path, segments));
        }

        if staged != self.data {
            self.data = staged;
            for (_, segments) in &written {
                self.record_change(segments);
            }
            self.version += 1;
        } else {
            debug!("data model update at {base} changed nothing");
        }
        Ok(written.into_iter().map(|(path, _)| path).collect())
    }

    /// Remove the node at `path`, returning it. Deleting `/` empties the model.
    pub fn delete(&mut self, path: &str) -> A2uiResult<Option<Value>> {
        let segments = parse_pointer(path);
        let Some((last, parents)) = segments.split_last() else {
            let prior = std::mem::replace(&mut self.data, Value::Object(Map::new()));
            self.record_change(&segments);
            self.version += 1;
            return Ok(Some(prior));
        };

        let removed = match lookup_mut(&mut self.data, parents) {
            Some(Value::Object(map)) => map.remove(last),
            Some(Value::Array(arr)) => {
                let index = parse_index(last, path)?;
                (index < arr.len()).then(|| arr.remove(index))
            }
            Some(other) => {
                return Err(A2uiError::invalid_path(
                    path,
                    format!("cannot delete inside a {} value", type_name(other)),
                ));
            }
            None => None,
        };

        if removed.is_some() {
            self.record_change(&segments);
            self.version += 1;
        }
        Ok(removed)
    }

    // ========================================================================
    // Change tracking
    // ========================================================================

    /// Whether a read of `path` may be stale: it or one of its ancestors or
    /// descendants was written since the last `take_changes`.
    pub fn is_dirty(&self, path: &str) -> bool {
        let probe = normalize(path);
        self.changes.contains(&probe)
            || self.written.iter().any(|written| is_within(&probe, written))
    }

    pub fn dirty_paths(&self) -> &BTreeSet<String> {
        &self.changes
    }

    /// Drain the recorded stale paths.
    pub fn take_changes(&mut self) -> Vec<String> {
        self.written.clear();
        std::mem::take(&mut self.changes).into_iter().collect()
    }

    fn record_change(&mut self, segments: &[String]) {
        self.written.insert(to_path(segments));
        for depth in 0..=segments.len() {
            self.changes.insert(to_path(&segments[..depth]));
        }
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// Split a path into decoded segments. `""` and `"/"` are the root.
pub(crate) fn parse_pointer(path: &str) -> Vec<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return vec![];
    }
    trimmed
        .trim_end_matches('/')
        .split('/')
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn to_path(segments: &[String]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments.iter().fold(String::new(), |mut acc, s| {
        acc.push('/');
        acc.push_str(&escape_segment(s));
        acc
    })
}

fn normalize(path: &str) -> String {
    to_path(&parse_pointer(path))
}

/// `inner` equals `outer` or lies underneath it.
fn is_within(inner: &str, outer: &str) -> bool {
    outer == "/"
        || inner == outer
        || (inner.starts_with(outer) && inner.as_bytes().get(outer.len()) == Some(&b'/'))
}

fn parse_index(segment: &str, path: &str) -> A2uiResult<usize> {
    segment.parse::<usize>().map_err(|_| {
        A2uiError::invalid_path(path, format!("`{segment}` is not an array index"))
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

fn empty_container(next_segment: Option<&String>) -> Value {
    match next_segment {
        Some(seg) if seg.parse::<usize>().is_ok() => Value::Array(vec![]),
        _ => Value::Object(Map::new()),
    }
}

// ============================================================================
// Tree operations
// ============================================================================

fn lookup<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?),
        _ => None,
    })
}

fn try_lookup<'a>(
    root: &'a Value,
    segments: &[String],
    path: &str,
) -> A2uiResult<Option<&'a Value>> {
    let mut current = root;
    for segment in segments {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(arr) => arr.get(parse_index(segment, path)?),
            Value::Null => None,
            scalar => {
                return Err(A2uiError::invalid_path(
                    path,
                    format!("`{segment}` traverses a {} value", type_name(scalar)),
                ));
            }
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn lookup_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(arr) => arr.get_mut(segment.parse::<usize>().ok()?),
        _ => None,
    })
}

/// Read-only walk proving `merge_at` will succeed for these segments.
fn check_writable(root: &Value, segments: &[String], path: &str) -> A2uiResult<()> {
    let mut current = Some(root);
    for segment in segments {
        current = match current {
            // Created on the way down: an array when this segment is numeric, so it must be 0
            None => match segment.parse::<usize>() {
                Ok(0) | Err(_) => None,
                Ok(index) => {
                    return Err(A2uiError::invalid_path(
                        path,
                        format!("index {index} is past the end of a new array"),
                    ));
                }
            },
            Some(Value::Object(map)) => map.get(segment),
            Some(Value::Array(arr)) => {
                let index = parse_index(segment, path)?;
                if index > arr.len() {
                    return Err(A2uiError::invalid_path(
                        path,
                        format!("index {index} is past the end of an array of {}", arr.len()),
                    ));
                }
                arr.get(index)
            }
            Some(scalar) => {
                return Err(A2uiError::invalid_path(
                    path,
                    format!("`{segment}` traverses a {} value", type_name(scalar)),
                ));
            }
        };
    }
    Ok(())
}

fn merge_at(
    root: &mut Value,
    segments: &[String],
    value: Value,
    path: &str,
) -> A2uiResult<Option<Value>> {
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let next = segments.get(i + 1);
        current = match current {
            Value::Object(map) => {
                if next.is_none() && !map.contains_key(segment) {
                    map.insert(segment.clone(), value);
                    return Ok(None);
                }
                map.entry(segment.clone())
                    .or_insert_with(|| empty_container(next))
            }
            Value::Array(arr) => {
                let index = parse_index(segment, path)?;
                if index == arr.len() {
                    if next.is_none() {
                        arr.push(value);
                        return Ok(None);
                    }
                    arr.push(empty_container(next));
                }
                arr.get_mut(index).ok_or_else(|| {
                    A2uiError::invalid_path(path, format!("index {index} is out of bounds"))
                })?
            }
            scalar => {
                return Err(A2uiError::invalid_path(
                    path,
                    format!("`{segment}` traverses a {} value", type_name(scalar)),
                ));
            }
        };
    }

    let prior = current.clone();
    merge_node(current, value);
    Ok(Some(prior))
}

/// Maps merge recursively key by key; anything else replaces the target.
fn merge_node(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_node(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2ui::message::DataValue;
    use serde_json::json;

    #[test]
    fn test_merge_scalars() {
        let mut model = DataModel::new();

        model.merge("/name", json!("Alice")).unwrap();
        model.merge("/count", json!(42)).unwrap();
        model.merge("/enabled", json!(true)).unwrap();

        assert_eq!(model.get_string("/name"), Some("Alice"));
        assert_eq!(model.get_number("/count"), Some(42.0));
        assert_eq!(model.get_bool("/enabled"), Some(true));
    }

    #[test]
    fn test_merge_returns_prior_value() {
        let mut model = DataModel::new();
        assert_eq!(model.merge("/form/name", json!("Alice")).unwrap(), None);
        assert_eq!(
            model.merge("/form/name", json!("Carol")).unwrap(),
            Some(json!("Alice"))
        );
        assert_eq!(model.get_string("/form/name"), Some("Carol"));
    }

    #[test]
    fn test_map_merge_preserves_untouched_keys() {
        let mut model = DataModel::new();
        model.merge("/obj", json!({"a": 1})).unwrap();
        model.merge("/obj", json!({"b": 2})).unwrap();
        assert_eq!(model.get("/obj"), Some(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_map_merge_is_recursive() {
        let mut model = DataModel::new();
        model.merge("/", json!({"user": {"name": "A", "age": 3}})).unwrap();
        model.merge("/", json!({"user": {"age": 4}})).unwrap();
        assert_eq!(model.get("/user"), Some(&json!({"name": "A", "age": 4})));
    }

    #[test]
    fn test_scalar_replaces_map() {
        let mut model = DataModel::new();
        model.merge("/obj", json!({"a": 1})).unwrap();
        model.merge("/obj", json!("flat")).unwrap();
        assert_eq!(model.get("/obj"), Some(&json!("flat")));
    }

    #[test]
    fn test_array_is_replaced_not_merged() {
        let mut model = DataModel::new();
        model.merge("/items", json!([1, 2, 3, 4, 5])).unwrap();
        model.merge("/items", json!([9, 8])).unwrap();
        assert_eq!(model.get_array("/items").map(Vec::len), Some(2));
    }

    #[test]
    fn test_merge_same_value_is_noop() {
        let mut model = DataModel::new();
        model
            .merge("/cart", json!({"items": [{"sku": "a"}], "total": 3}))
            .unwrap();
        model.take_changes();
        let version = model.version();

        let current = model.get("/cart").cloned().unwrap();
        model.merge("/cart", current.clone()).unwrap();

        assert_eq!(model.get("/cart"), Some(&current));
        assert_eq!(model.version(), version);
        assert!(model.take_changes().is_empty());
    }

    #[test]
    fn test_array_index_paths() {
        let mut model = DataModel::new();
        model.merge("/items", json!([{"id": 1}, {"id": 2}])).unwrap();
        model.merge("/items/1/id", json!(20)).unwrap();
        model.merge("/items/2", json!({"id": 3})).unwrap();

        assert_eq!(model.get_number("/items/1/id"), Some(20.0));
        assert_eq!(model.get_number("/items/2/id"), Some(3.0));
        assert!(model.get("/items/x").is_none());
    }

    #[test]
    fn test_try_get_reports_unaddressable_paths() {
        let mut model = DataModel::new();
        model
            .merge("/", json!({"user": {"name": "Bob", "nick": null}, "items": [{"id": 1}]}))
            .unwrap();

        assert_eq!(model.try_get("/user/name").unwrap(), Some(&json!("Bob")));
        assert_eq!(model.try_get("/user/email").unwrap(), None);
        assert_eq!(model.try_get("/user/nick/short").unwrap(), None);
        assert_eq!(model.try_get("/items/3/id").unwrap(), None);

        let err = model.try_get("/user/name/first").unwrap_err();
        assert!(matches!(&err, A2uiError::InvalidPath { path, .. } if path == "/user/name/first"));
        assert!(matches!(
            model.try_get("/items/first"),
            Err(A2uiError::InvalidPath { .. })
        ));
        // the lenient read still answers absent
        assert!(model.get("/user/name/first").is_none());
    }

    #[test]
    fn test_creates_intermediate_containers() {
        let mut model = DataModel::new();
        model.merge("/a/list/0/name", json!("first")).unwrap();
        assert_eq!(model.get("/a"), Some(&json!({"list": [{"name": "first"}]})));
    }

    #[test]
    fn test_traversing_scalar_is_invalid_path() {
        let mut model = DataModel::new();
        model.merge("/name", json!("Alice")).unwrap();
        let before = model.clone();

        let err = model.merge("/name/first", json!("A")).unwrap_err();
        assert!(matches!(err, A2uiError::InvalidPath { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn test_index_past_end_leaves_model_untouched() {
        let mut model = DataModel::new();
        model.merge("/items", json!([1])).unwrap();
        let before = model.clone();

        assert!(model.merge("/items/5", json!(2)).is_err());
        assert!(model.merge("/fresh/3/x", json!(2)).is_err());
        assert!(model.merge("/items/name", json!(2)).is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn test_changes_include_ancestors() {
        let mut model = DataModel::new();
        model.merge("/a/b/c", json!(1)).unwrap();

        assert!(model.is_dirty("/a"));
        assert!(model.is_dirty("/a/b/c/d"));
        assert!(!model.is_dirty("/other"));
        assert_eq!(model.take_changes(), vec!["/", "/a", "/a/b", "/a/b/c"]);
        assert!(!model.is_dirty("/a"));
    }

    #[test]
    fn test_apply_update_is_atomic() {
        let mut model = DataModel::new();
        model.merge("/list", json!([1])).unwrap();
        let before = model.clone();

        let contents = vec![
            DataContent::new("1", DataValue::ValueNumber(2.0)),
            DataContent::new("x", DataValue::ValueString("A".into())),
        ];
        assert!(model.apply_update("/list", &contents).is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn test_apply_update_merges_each_key() {
        let mut model = DataModel::new();
        let contents = vec![
            DataContent::new("name", DataValue::ValueString("Alice".into())),
            DataContent::new(
                "prefs",
                DataValue::ValueMap(vec![DataContent::new("dark", DataValue::ValueBoolean(true))]),
            ),
        ];
        let written = model.apply_update("/user", &contents).unwrap();
        assert_eq!(written, vec!["/user/name", "/user/prefs"]);
        assert_eq!(model.get_bool("/user/prefs/dark"), Some(true));
        assert_eq!(model.version(), 1);
    }

    #[test]
    fn test_delete() {
        let mut model = DataModel::new();
        model.merge("/name", json!("Alice")).unwrap();
        assert_eq!(model.delete("/name").unwrap(), Some(json!("Alice")));
        assert!(model.get("/name").is_none());
        assert_eq!(model.delete("/missing").unwrap(), None);
    }

    #[test]
    fn test_escaped_segments() {
        let mut model = DataModel::new();
        model.merge("/a~1b", json!(1)).unwrap();
        assert_eq!(model.as_value(), &json!({"a/b": 1}));
        assert_eq!(model.get_number("/a~1b"), Some(1.0));
    }
}
