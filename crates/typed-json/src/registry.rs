//! Type descriptors and the ordered registry that matches values against them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::builtins;
use crate::error::DescriptorError;
use crate::value::{Instance, Value};

/// How one type converts to and from its plain JSON form.
pub trait TypeCodec: Send + Sync {
    /// Unique wire name, stored in the metadata type table.
    fn name(&self) -> &str;

    /// Whether this descriptor handles `instance`.
    fn matches(&self, instance: &Instance) -> bool;

    fn encode(&self, instance: &Instance) -> Result<JsonValue, DescriptorError>;

    fn decode(&self, plain: JsonValue) -> Result<Value, DescriptorError>;
}

type Predicate = dyn Fn(&Instance) -> bool + Send + Sync;
type EncodeFn<T> = dyn Fn(&T) -> Result<JsonValue, DescriptorError> + Send + Sync;
type DecodeFn<T> = dyn Fn(JsonValue) -> Result<T, DescriptorError> + Send + Sync;

/// Closure-backed [`TypeCodec`] for a concrete Rust type `T`.
///
/// By default an instance matches when it holds a `T`.
pub struct TypeDescriptor<T> {
    name: String,
    predicate: Option<Box<Predicate>>,
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
}

impl<T> TypeDescriptor<T>
where
    T: Any + Send + Sync + fmt::Debug + PartialEq,
{
    pub fn new<E, D>(name: impl Into<String>, encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<JsonValue, DescriptorError> + Send + Sync + 'static,
        D: Fn(JsonValue) -> Result<T, DescriptorError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: None,
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }

    /// Like [`TypeDescriptor::new`], named after `T`'s unqualified type name.
    pub fn of_type<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<JsonValue, DescriptorError> + Send + Sync + 'static,
        D: Fn(JsonValue) -> Result<T, DescriptorError> + Send + Sync + 'static,
    {
        Self::new(short_type_name::<T>(), encode, decode)
    }

    /// Narrows or replaces the default "is a `T`" check.
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

impl<T> TypeCodec for TypeDescriptor<T>
where
    T: Any + Send + Sync + fmt::Debug + PartialEq,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, instance: &Instance) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(instance),
            None => instance.is::<T>(),
        }
    }

    fn encode(&self, instance: &Instance) -> Result<JsonValue, DescriptorError> {
        let value = instance
            .downcast_ref::<T>()
            .ok_or_else(|| DescriptorError::Unsupported {
                expected: std::any::type_name::<T>(),
                found: instance.type_name(),
            })?;
        (self.encode)(value)
    }

    fn decode(&self, plain: JsonValue) -> Result<Value, DescriptorError> {
        (self.decode)(plain).map(Value::instance)
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Ordered catalogue of descriptors.
///
/// Matching walks descriptors in first-registration order and the first match
/// wins. Registering a name again replaces that descriptor but keeps its
/// original position. The registry is fixed once built.
#[derive(Clone)]
pub struct TypeRegistry {
    descriptors: IndexMap<String, Arc<dyn TypeCodec>>,
}

impl TypeRegistry {
    /// Registry holding only the built-in descriptors.
    pub fn builtin() -> Self {
        Self::with_descriptors(std::iter::empty())
    }

    /// Built-ins followed by `extra`, applied in order.
    pub fn with_descriptors<I>(extra: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn TypeCodec>>,
    {
        let mut registry = Self::empty();
        for descriptor in builtins::descriptors() {
            registry.register(descriptor);
        }
        let mut overrides = 0usize;
        for descriptor in extra {
            if registry.register(descriptor) {
                overrides += 1;
            }
        }
        tracing::debug!(
            descriptors = registry.len(),
            overrides,
            "type registry built"
        );
        registry
    }

    /// Registry without built-ins.
    pub fn empty() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Returns `true` when an existing descriptor of the same name was replaced.
    fn register(&mut self, descriptor: Arc<dyn TypeCodec>) -> bool {
        let name = descriptor.name().to_owned();
        if self.descriptors.contains_key(&name) {
            tracing::trace!(name = %name, "descriptor overridden");
        }
        self.descriptors.insert(name, descriptor).is_some()
    }

    /// First descriptor, in registration order, whose predicate accepts `instance`.
    pub fn lookup_by_value(&self, instance: &Instance) -> Option<&dyn TypeCodec> {
        self.descriptors
            .values()
            .find(|descriptor| descriptor.matches(instance))
            .map(|descriptor| descriptor.as_ref())
    }

    /// Descriptor currently registered under `name`.
    pub fn lookup_by_name(&self, name: &str) -> Option<&dyn TypeCodec> {
        self.descriptors.get(name).map(|descriptor| descriptor.as_ref())
    }

    /// Names in match order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
