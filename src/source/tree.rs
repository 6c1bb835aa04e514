//! Reading and writing nested JSON values by path.
//!
//! The database stores no empty objects: writing `null` (or `{}`) deletes a
//! node, and parents left empty are removed with it. Object key order is
//! preserved, so new children are appended and existing ones keep their
//! position.

use serde_json::{Map, Value};

use super::DbPath;

/// Returns the value at `path`, or `None` if nothing is stored there.
pub fn get_at<'a>(root: &'a Value, path: &DbPath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Returns an owned copy of the value at `path` (`Value::Null` if absent).
pub fn value_at(root: &Value, path: &DbPath) -> Value {
    get_at(root, path).cloned().unwrap_or(Value::Null)
}

/// Write `value` at `path`, deleting the node when `value` is empty.
pub fn set_at(root: &mut Value, path: &DbPath, value: Value) {
    if is_empty(&value) {
        remove_at(root, path.segments());
    } else {
        insert_at(root, path.segments(), value);
    }
}

/// Merge each child of `children` under `path`, as a `patch` does.
pub fn update_at(root: &mut Value, path: &DbPath, children: Map<String, Value>) {
    for (key, value) in children {
        set_at(root, &path.child(&key), value);
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn insert_at(node: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        insert_at(child, rest, value);
    }
}

fn remove_at(node: &mut Value, segments: &[String]) {
    let Some((first, rest)) = segments.split_first() else {
        *node = Value::Null;
        return;
    };
    let Value::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        map.shift_remove(first);
    } else if let Some(child) = map.get_mut(first) {
        remove_at(child, rest);
        if child.is_null() {
            map.shift_remove(first);
        }
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_at_nested() {
        let root = json!({"realtime": {"temperature": 21.5}});
        assert_eq!(get_at(&root, &DbPath::parse("realtime/temperature")), Some(&json!(21.5)));
        assert_eq!(get_at(&root, &DbPath::parse("realtime/humidity")), None);
        assert_eq!(get_at(&root, &DbPath::parse("realtime/temperature/x")), None);
        assert_eq!(get_at(&root, &DbPath::root()), Some(&root));
    }

    #[test]
    fn test_set_at_creates_parents() {
        let mut root = Value::Null;
        set_at(&mut root, &DbPath::parse("data/2025/03/05/08:00"), json!({"temperature": 20}));
        assert_eq!(root, json!({"data": {"2025": {"03": {"05": {"08:00": {"temperature": 20}}}}}}));
    }

    #[test]
    fn test_set_null_prunes_empty_parents() {
        let mut root = json!({"data": {"2025": {"03": {"05": 1}}}, "realtime": {"humidity": 50}});
        set_at(&mut root, &DbPath::parse("data/2025/03/05"), Value::Null);
        assert_eq!(root, json!({"realtime": {"humidity": 50}}));
    }

    #[test]
    fn test_set_keeps_key_order() {
        let mut root = json!({"08:00": 1, "09:00": 2});
        set_at(&mut root, &DbPath::parse("08:00"), json!(3));
        set_at(&mut root, &DbPath::parse("07:00"), json!(4));
        let keys: Vec<&String> = root.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["08:00", "09:00", "07:00"]);
    }

    #[test]
    fn test_update_at_merges_children() {
        let mut root = json!({"realtime": {"temperature": 20, "humidity": 40}});
        let patch = json!({"temperature": 22, "humidity": null});
        update_at(
            &mut root,
            &DbPath::parse("realtime"),
            patch.as_object().unwrap().clone(),
        );
        assert_eq!(root, json!({"realtime": {"temperature": 22}}));
    }
}
