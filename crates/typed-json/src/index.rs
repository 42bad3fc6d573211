//! The type index: a de-duplicated name table plus a tree locating each typed leaf.
//!
//! The index tree mirrors the branches of the plain output that lead to at
//! least one typed leaf. Each of its leaves is an integer position into the
//! name table. Array branches are dense JSON arrays with `null` at untyped
//! positions.

use indexmap::IndexSet;
use serde_json::Value as JsonValue;
use typed_json_path::{Path, PathSegment};

use crate::error::DecodeError;
use crate::metadata::Metadata;
use crate::tree::{TreeBuilder, TreeError};

#[derive(Debug, Default)]
pub struct TypeIndexBuilder {
    names: IndexSet<String>,
    tree: TreeBuilder<JsonValue>,
}

impl TypeIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a typed leaf at `path`, returning the name's table position.
    pub fn record(&mut self, path: &Path, name: &str) -> Result<usize, TreeError> {
        let position = match self.names.get_index_of(name) {
            Some(position) => position,
            None => self.names.insert_full(name.to_owned()).0,
        };
        self.tree.set(path, JsonValue::from(position))?;
        Ok(position)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Type names in first-use order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// `None` when nothing was recorded.
    pub fn finish(self) -> Option<Metadata> {
        let index = self.tree.finish()?;
        Some(Metadata::new(self.names.into_iter().collect(), index))
    }
}

/// Flattens an index tree back into `(path, name position)` pairs, depth first.
///
/// Metadata only ever rides on an object root, so the index root must be an
/// object. `null` array entries are holes and are skipped.
pub fn flatten_index(
    index: &JsonValue,
    max_depth: Option<usize>,
) -> Result<Vec<(Path, usize)>, DecodeError> {
    if !index.is_object() {
        return Err(DecodeError::malformed("index root must be an object"));
    }
    let mut out = Vec::new();
    let mut path = Path::new();
    walk_index(index, &mut path, max_depth, &mut out)?;
    Ok(out)
}

fn walk_index(
    node: &JsonValue,
    path: &mut Path,
    max_depth: Option<usize>,
    out: &mut Vec<(Path, usize)>,
) -> Result<(), DecodeError> {
    match node {
        JsonValue::Number(n) => {
            let position = n
                .as_u64()
                .and_then(|p| usize::try_from(p).ok())
                .ok_or_else(|| {
                    DecodeError::malformed(format!("index leaf at `{path}` is not a table position: {n}"))
                })?;
            out.push((path.clone(), position));
        }
        JsonValue::Array(items) => {
            check_depth(path, max_depth)?;
            for (i, item) in items.iter().enumerate() {
                if item.is_null() {
                    continue;
                }
                path.push(PathSegment::Index(i));
                walk_index(item, path, max_depth, out)?;
                path.pop();
            }
        }
        JsonValue::Object(map) => {
            check_depth(path, max_depth)?;
            for (key, item) in map {
                path.push(PathSegment::Key(key.clone()));
                walk_index(item, path, max_depth, out)?;
                path.pop();
            }
        }
        other => {
            return Err(DecodeError::malformed(format!(
                "unexpected {other} in index at `{path}`"
            )))
        }
    }
    Ok(())
}

fn check_depth(path: &Path, max_depth: Option<usize>) -> Result<(), DecodeError> {
    match max_depth {
        Some(max_depth) if path.len() >= max_depth => Err(DecodeError::DepthExceeded {
            path: path.clone(),
            max_depth,
        }),
        _ => Ok(()),
    }
}
