//! The [`Codec`] facade over `serialize` and `deserialize`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use typed_json_path::Path;

use crate::error::{json_kind, DecodeError, EncodeError};
use crate::flatten::{Leaf, PathFlattener};
use crate::index::{flatten_index, TypeIndexBuilder};
use crate::metadata::{Metadata, METADATA_KEY};
use crate::registry::{TypeCodec, TypeRegistry};
use crate::tree::{self, TreeBuilder};
use crate::value::Value;

/// Construction options for [`Codec`].
#[derive(Clone, Default)]
pub struct CodecOptions {
    /// Extra descriptors, appended after the built-ins. A descriptor reusing a
    /// built-in name overrides it in place.
    pub descriptors: Vec<Arc<dyn TypeCodec>>,
    /// Maximum container nesting accepted by either direction. Unbounded when `None`.
    pub max_depth: Option<usize>,
}

impl CodecOptions {
    pub fn descriptor(mut self, descriptor: impl TypeCodec + 'static) -> Self {
        self.descriptors.push(Arc::new(descriptor));
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

impl fmt::Debug for CodecOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecOptions")
            .field(
                "descriptors",
                &self.descriptors.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Converts [`Value`] graphs to plain JSON plus a type index, and back.
///
/// The registry is fixed at construction, so a `Codec` can be shared across
/// threads and used concurrently.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    registry: TypeRegistry,
    max_depth: Option<usize>,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self {
            registry: TypeRegistry::with_descriptors(options.descriptors),
            max_depth: options.max_depth,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Encodes `value` into plain JSON.
    ///
    /// Typed leaves are replaced by their descriptor's plain form and located
    /// by a single `__t` entry on the root object. Values without typed leaves
    /// come back with no `__t` key at all.
    ///
    /// Array and primitive roots pass through only while they hold no typed
    /// leaves; otherwise there is no object to carry `__t` and this fails with
    /// [`EncodeError::RootNotObject`].
    pub fn serialize(&self, value: &Value) -> Result<JsonValue, EncodeError> {
        match value {
            Value::Object(object) if object.contains_key(METADATA_KEY) => {
                return Err(EncodeError::ReservedKey { key: METADATA_KEY })
            }
            Value::Instance(_) => {
                return Err(EncodeError::RootNotObject {
                    found: value.kind(),
                })
            }
            _ => {}
        }

        let entries = PathFlattener::new(&self.registry)
            .with_max_depth(self.max_depth)
            .flatten(value)?;

        let mut out = TreeBuilder::new();
        let mut index = TypeIndexBuilder::new();
        let mut typed_leaves = 0usize;
        for entry in entries {
            let plain = match entry.leaf {
                Leaf::Primitive(plain) => plain,
                Leaf::EmptyArray => JsonValue::Array(Vec::new()),
                Leaf::EmptyObject => JsonValue::Object(serde_json::Map::new()),
                Leaf::Typed { codec, instance } => {
                    let plain =
                        codec
                            .encode(instance)
                            .map_err(|source| EncodeError::Descriptor {
                                path: entry.path.clone(),
                                name: codec.name().to_owned(),
                                source,
                            })?;
                    index.record(&entry.path, codec.name())?;
                    typed_leaves += 1;
                    plain
                }
            };
            out.set(&entry.path, plain)?;
        }

        tracing::trace!(
            typed_leaves,
            types = ?index.names().collect::<Vec<_>>(),
            "serialized value"
        );

        let plain = out.finish().unwrap_or(JsonValue::Null);
        let Some(metadata) = index.finish() else {
            return Ok(plain);
        };
        match plain {
            JsonValue::Object(mut map) => {
                map.insert(METADATA_KEY.to_owned(), metadata.to_json()?);
                Ok(JsonValue::Object(map))
            }
            other => Err(EncodeError::RootNotObject {
                found: json_kind(&other),
            }),
        }
    }

    /// Rebuilds the original value from plain JSON produced by [`Codec::serialize`].
    ///
    /// Input without a root `__t` key is returned as-is. Otherwise the whole
    /// side-channel is checked first: every name must be registered and every
    /// indexed path must exist. Only then are typed leaves decoded and written
    /// back in place, leaving every other node exactly as received.
    pub fn deserialize(&self, plain: JsonValue) -> Result<Value, DecodeError> {
        let mut map = match plain {
            JsonValue::Object(map) => map,
            other => return Ok(Value::from(other)),
        };
        let Some(raw) = map.shift_remove(METADATA_KEY) else {
            return Ok(Value::from(JsonValue::Object(map)));
        };
        let metadata = Metadata::from_json(raw)?;
        let mut root = JsonValue::Object(map);

        let mut resolved: Vec<(Path, &dyn TypeCodec)> = Vec::new();
        for (path, position) in flatten_index(&metadata.index, self.max_depth)? {
            let name = metadata.type_name(position)?;
            let codec = self
                .registry
                .lookup_by_name(name)
                .ok_or_else(|| DecodeError::UnknownType {
                    name: name.to_owned(),
                })?;
            if tree::get(&root, &path).is_none() {
                return Err(DecodeError::ShapeMismatch { path });
            }
            resolved.push((path, codec));
        }

        let mut decoded = Vec::with_capacity(resolved.len());
        for (path, codec) in resolved {
            let slot = tree::get_mut(&mut root, &path)
                .ok_or_else(|| DecodeError::ShapeMismatch { path: path.clone() })?;
            let value = codec
                .decode(slot.take())
                .map_err(|source| DecodeError::Descriptor {
                    path: path.clone(),
                    name: codec.name().to_owned(),
                    source,
                })?;
            decoded.push((path, value));
        }

        tracing::trace!(
            typed_leaves = decoded.len(),
            types = ?metadata.type_names,
            "deserialized value"
        );

        let mut out = TreeBuilder::from_root(Value::from(root));
        for (path, value) in decoded {
            out.set(&path, value)?;
        }
        Ok(out.finish().unwrap_or_default())
    }
}
