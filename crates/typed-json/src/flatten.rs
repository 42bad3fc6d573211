//! Depth-first flattening of a [`Value`] into ordered `(path, leaf)` entries.
//!
//! Arrays and objects are always descended into; only primitives and
//! registered instances become leaves. Empty containers produce a marker entry
//! so the assembled tree keeps them.

use serde_json::Value as JsonValue;
use typed_json_path::{Path, PathSegment};

use crate::error::EncodeError;
use crate::registry::{TypeCodec, TypeRegistry};
use crate::value::{Instance, Value};

/// What sits at one flattened position.
pub enum Leaf<'a> {
    /// `null`, booleans, numbers and strings, already in plain form.
    Primitive(JsonValue),
    /// An instance together with the descriptor it matched.
    Typed {
        codec: &'a dyn TypeCodec,
        instance: &'a Instance,
    },
    EmptyArray,
    EmptyObject,
}

impl Leaf<'_> {
    pub fn is_typed(&self) -> bool {
        matches!(self, Leaf::Typed { .. })
    }
}

impl std::fmt::Debug for Leaf<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leaf::Primitive(value) => f.debug_tuple("Primitive").field(value).finish(),
            Leaf::Typed { codec, instance } => f
                .debug_struct("Typed")
                .field("name", &codec.name())
                .field("instance", instance)
                .finish(),
            Leaf::EmptyArray => f.write_str("EmptyArray"),
            Leaf::EmptyObject => f.write_str("EmptyObject"),
        }
    }
}

#[derive(Debug)]
pub struct FlatEntry<'a> {
    pub path: Path,
    pub leaf: Leaf<'a>,
}

/// Walks values using a registry's predicates for leaf detection.
#[derive(Debug, Clone, Copy)]
pub struct PathFlattener<'r> {
    registry: &'r TypeRegistry,
    max_depth: Option<usize>,
}

impl<'r> PathFlattener<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            max_depth: None,
        }
    }

    /// Fails with [`EncodeError::DepthExceeded`] past `max_depth` nested containers.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn flatten<'a>(&self, value: &'a Value) -> Result<Vec<FlatEntry<'a>>, EncodeError>
    where
        'r: 'a,
    {
        let mut out = Vec::new();
        let mut path = Path::new();
        self.walk(value, &mut path, &mut out)?;
        Ok(out)
    }

    fn walk<'a>(
        &self,
        value: &'a Value,
        path: &mut Path,
        out: &mut Vec<FlatEntry<'a>>,
    ) -> Result<(), EncodeError>
    where
        'r: 'a,
    {
        let leaf = match value {
            Value::Undefined => return Ok(()),
            Value::Null => Leaf::Primitive(JsonValue::Null),
            Value::Bool(b) => Leaf::Primitive(JsonValue::Bool(*b)),
            Value::Number(n) => Leaf::Primitive(JsonValue::Number(n.clone())),
            Value::String(s) => Leaf::Primitive(JsonValue::String(s.clone())),
            Value::Instance(instance) => match self.registry.lookup_by_value(instance) {
                Some(codec) => Leaf::Typed { codec, instance },
                None => {
                    return Err(EncodeError::Unsupported {
                        path: path.clone(),
                        type_name: instance.type_name(),
                    })
                }
            },
            Value::Array(items) if items.is_empty() => Leaf::EmptyArray,
            Value::Object(object) if object.is_empty() => Leaf::EmptyObject,
            Value::Array(items) => {
                self.check_depth(path)?;
                for (index, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    self.walk(item, path, out)?;
                    path.pop();
                }
                return Ok(());
            }
            Value::Object(object) => {
                self.check_depth(path)?;
                for (key, item) in object {
                    path.push(PathSegment::Key(key.clone()));
                    self.walk(item, path, out)?;
                    path.pop();
                }
                return Ok(());
            }
        };
        out.push(FlatEntry {
            path: path.clone(),
            leaf,
        });
        Ok(())
    }

    fn check_depth(&self, path: &Path) -> Result<(), EncodeError> {
        match self.max_depth {
            Some(max_depth) if path.len() >= max_depth => Err(EncodeError::DepthExceeded {
                path: path.clone(),
                max_depth,
            }),
            _ => Ok(()),
        }
    }
}
