//! Tree operations over a `serde_json::Value` root
//!
//! The tree never stores `null` or empty objects: writing `null` removes the
//! node and removals prune ancestors that become empty.

use crate::path::StorePath;
use serde_json::{Map, Value};

pub(crate) fn get<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Set `value` at `path`, creating intermediate objects. A `null` value
/// removes the node instead.
pub(crate) fn set(root: &mut Value, path: &StorePath, value: Value) {
    if value.is_null() || is_empty_object(&value) {
        remove(root, path);
        return;
    }

    let mut node = root;
    for segment in path.segments() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map.entry(segment.clone()).or_insert(Value::Null),
            // replaced by an object just above
            _ => return,
        };
    }
    *node = prune(value);
}

/// Remove the node at `path`, pruning emptied ancestors. Returns the removed
/// value if there was one.
pub(crate) fn remove(root: &mut Value, path: &StorePath) -> Option<Value> {
    remove_in(root, path.segments())
}

fn remove_in(node: &mut Value, segments: &[String]) -> Option<Value> {
    let map = node.as_object_mut()?;
    let (head, rest) = segments.split_first()?;

    if rest.is_empty() {
        return map.remove(head);
    }

    let child = map.get_mut(head)?;
    let removed = remove_in(child, rest);
    if removed.is_some() && is_empty_object(child) {
        map.remove(head);
    }
    removed
}

/// Drop nulls and empty objects from a value before it enters the tree.
fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| {
                    let v = prune(v);
                    if v.is_null() || is_empty_object(&v) {
                        None
                    } else {
                        Some((k, v))
                    }
                })
                .collect();
            Value::Object(pruned)
        }
        other => other,
    }
}

fn is_empty_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.is_empty())
}
