//! Incremental tree assembly from `(path, value)` pairs.
//!
//! [`TreeBuilder`] is the inverse of flattening: every pair is merged into a
//! single accumulating tree, creating intermediate containers on demand. An
//! index segment makes the container at that level an array, a key segment
//! makes it an object. Siblings written by earlier pairs are never disturbed.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use typed_json_path::{Path, PathSegment};

use crate::value::{Object, Value};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A path runs through a value that is not a container of the kind its
    /// next segment addresses.
    #[error("path `{path}` conflicts with a value already in the tree")]
    Conflict { path: Path },
}

/// A node kind [`TreeBuilder`] can assemble.
pub trait TreeNode: Sized {
    /// Empty array for index segments, empty object for key segments.
    fn container_for(segment: &PathSegment) -> Self;

    /// Filler for array holes and freshly created slots.
    fn placeholder() -> Self;

    fn is_placeholder(&self) -> bool;

    fn child(&self, segment: &PathSegment) -> Option<&Self>;

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut Self>;

    /// Returns the slot addressed by `segment`, creating it when absent.
    ///
    /// Returns `None` when `self` is not a container of the matching kind.
    fn slot_mut(&mut self, segment: &PathSegment) -> Option<&mut Self>;
}

impl TreeNode for JsonValue {
    fn container_for(segment: &PathSegment) -> Self {
        match segment {
            PathSegment::Index(_) => JsonValue::Array(Vec::new()),
            PathSegment::Key(_) => JsonValue::Object(Map::new()),
        }
    }

    fn placeholder() -> Self {
        JsonValue::Null
    }

    fn is_placeholder(&self) -> bool {
        self.is_null()
    }

    fn child(&self, segment: &PathSegment) -> Option<&Self> {
        match (self, segment) {
            (JsonValue::Array(items), PathSegment::Index(index)) => items.get(*index),
            (JsonValue::Object(map), PathSegment::Key(key)) => map.get(key),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut Self> {
        match (self, segment) {
            (JsonValue::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            (JsonValue::Object(map), PathSegment::Key(key)) => map.get_mut(key),
            _ => None,
        }
    }

    fn slot_mut(&mut self, segment: &PathSegment) -> Option<&mut Self> {
        match (self, segment) {
            (JsonValue::Array(items), PathSegment::Index(index)) => {
                if items.len() <= *index {
                    items.resize_with(*index + 1, Self::placeholder);
                }
                items.get_mut(*index)
            }
            (JsonValue::Object(map), PathSegment::Key(key)) => {
                Some(map.entry(key.clone()).or_insert_with(Self::placeholder))
            }
            _ => None,
        }
    }
}

impl TreeNode for Value {
    fn container_for(segment: &PathSegment) -> Self {
        match segment {
            PathSegment::Index(_) => Value::Array(Vec::new()),
            PathSegment::Key(_) => Value::Object(Object::new()),
        }
    }

    fn placeholder() -> Self {
        Value::Null
    }

    fn is_placeholder(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    fn child(&self, segment: &PathSegment) -> Option<&Self> {
        match (self, segment) {
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            (Value::Object(object), PathSegment::Key(key)) => object.get(key),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut Self> {
        match (self, segment) {
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            (Value::Object(object), PathSegment::Key(key)) => object.get_mut(key),
            _ => None,
        }
    }

    fn slot_mut(&mut self, segment: &PathSegment) -> Option<&mut Self> {
        match (self, segment) {
            (Value::Array(items), PathSegment::Index(index)) => {
                if items.len() <= *index {
                    items.resize_with(*index + 1, Self::placeholder);
                }
                items.get_mut(*index)
            }
            (Value::Object(object), PathSegment::Key(key)) => {
                Some(object.entry(key.clone()).or_insert_with(Self::placeholder))
            }
            _ => None,
        }
    }
}

/// Reads the node at `path`.
pub fn get<'n, N: TreeNode>(root: &'n N, path: &Path) -> Option<&'n N> {
    path.iter().try_fold(root, |node, segment| node.child(segment))
}

/// Mutable counterpart of [`get`]. Never creates nodes.
pub fn get_mut<'n, N: TreeNode>(root: &'n mut N, path: &Path) -> Option<&'n mut N> {
    path.iter()
        .try_fold(root, |node, segment| node.child_mut(segment))
}

/// Accumulates `(path, value)` pairs into one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeBuilder<N> {
    root: Option<N>,
}

impl<N: TreeNode> Default for TreeBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TreeNode> TreeBuilder<N> {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Continues building on top of an existing tree, in place.
    pub fn from_root(root: N) -> Self {
        Self { root: Some(root) }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Writes `value` at `path`.
    ///
    /// Missing containers along the way are created, placeholders are
    /// replaced by containers, and only the final slot is overwritten.
    pub fn set(&mut self, path: &Path, value: N) -> Result<(), TreeError> {
        let Some(first) = path.first() else {
            self.root = Some(value);
            return Ok(());
        };
        let mut cursor = self.root.get_or_insert_with(|| N::container_for(first));
        for segment in path {
            if cursor.is_placeholder() {
                *cursor = N::container_for(segment);
            }
            cursor = match cursor.slot_mut(segment) {
                Some(slot) => slot,
                None => return Err(TreeError::Conflict { path: path.clone() }),
            };
        }
        *cursor = value;
        Ok(())
    }

    pub fn root(&self) -> Option<&N> {
        self.root.as_ref()
    }

    /// Returns the assembled tree, or `None` if nothing was ever set.
    pub fn finish(self) -> Option<N> {
        self.root
    }
}

/// Builds a tree from an ordered sequence of pairs.
pub fn build<N, I>(pairs: I) -> Result<Option<N>, TreeError>
where
    N: TreeNode,
    I: IntoIterator<Item = (Path, N)>,
{
    let mut builder = TreeBuilder::new();
    for (path, value) in pairs {
        builder.set(&path, value)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use typed_json_path::path;

    fn build_json(pairs: Vec<(Path, JsonValue)>) -> JsonValue {
        build(pairs).unwrap().unwrap_or_else(|| json!({}))
    }

    #[test]
    fn build_matrix() {
        assert_eq!(build_json(vec![]), json!({}));
        assert_eq!(build_json(vec![(path!["a"], json!(1))]), json!({"a": 1}));
        assert_eq!(
            build_json(vec![(path!["a", "b", "c"], json!(1))]),
            json!({"a": {"b": {"c": 1}}})
        );
        assert_eq!(
            build_json(vec![
                (path!["a", "b"], json!(1)),
                (path!["a", "c"], json!(1)),
                (path!["d"], json!(1)),
            ]),
            json!({"a": {"b": 1, "c": 1}, "d": 1})
        );
        assert_eq!(
            build_json(vec![
                (path!["a", "b", "c"], json!(1)),
                (path!["a", "b", "d"], json!(1)),
            ]),
            json!({"a": {"b": {"c": 1, "d": 1}}})
        );
        assert_eq!(
            build_json(vec![(path![0], json!(1)), (path![1], json!(2))]),
            json!([1, 2])
        );
    }

    #[test]
    fn index_segments_create_arrays_at_any_depth() {
        assert_eq!(
            build_json(vec![
                (path!["a", 0, 0], json!("x")),
                (path!["a", 0, 1], json!("y")),
                (path!["a", 1, "k"], json!(true)),
            ]),
            json!({"a": [["x", "y"], {"k": true}]})
        );
    }

    #[test]
    fn sparse_indices_leave_null_holes() {
        assert_eq!(
            build_json(vec![(path!["a", 2], json!(0))]),
            json!({"a": [null, null, 0]})
        );
    }

    #[test]
    fn key_order_follows_first_insertion() {
        let tree = build_json(vec![
            (path!["z", "x"], json!(1)),
            (path!["a"], json!(2)),
            (path!["z", "y"], json!(3)),
        ]);
        let keys: Vec<_> = tree.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a"]);
        assert_eq!(tree, json!({"z": {"x": 1, "y": 3}, "a": 2}));
    }

    #[test]
    fn conflicting_kinds_are_rejected() {
        let mut builder = TreeBuilder::new();
        builder.set(&path!["a"], json!("leaf")).unwrap();
        assert_eq!(
            builder.set(&path!["a", 0], json!(1)),
            Err(TreeError::Conflict {
                path: path!["a", 0]
            })
        );
        assert_eq!(
            builder.set(&path![0], json!(1)),
            Err(TreeError::Conflict { path: path![0] })
        );
    }

    #[test]
    fn writes_in_place_over_existing_tree() {
        let mut builder = TreeBuilder::from_root(json!({"keep": [1, 2], "swap": "old"}));
        builder.set(&path!["swap"], json!({"new": true})).unwrap();
        assert_eq!(
            builder.finish().unwrap(),
            json!({"keep": [1, 2], "swap": {"new": true}})
        );
    }

    #[test]
    fn root_path_replaces_root() {
        let mut builder = TreeBuilder::<Value>::new();
        builder.set(&Path::new(), Value::from(7)).unwrap();
        assert_eq!(builder.finish(), Some(Value::from(7)));
    }

    #[test]
    fn get_follows_segments() {
        let tree = json!({"a": [{"b": 1}]});
        assert_eq!(get(&tree, &path!["a", 0, "b"]), Some(&json!(1)));
        assert_eq!(get(&tree, &path!["a", "0"]), None);
        assert_eq!(get(&tree, &path!["missing"]), None);
        assert_eq!(get(&tree, &Path::new()), Some(&tree));
    }
}
