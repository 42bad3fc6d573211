//! Built-in descriptors: `Date`, `Buffer`, `Set` and `Map`.
//!
//! | name     | Rust type           | plain form                         |
//! |----------|---------------------|------------------------------------|
//! | `Date`   | `DateTime<Utc>`     | integer epoch milliseconds (exact) |
//! | `Buffer` | `Vec<u8>`           | padded standard base64 string      |
//! | `Set`    | [`ValueSet`]        | array of elements                  |
//! | `Map`    | [`ValueMap`]        | array of `[key, value]` pairs      |

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::DescriptorError;
use crate::registry::{TypeCodec, TypeDescriptor};
use crate::value::Value;

pub const DATE: &str = "Date";
pub const BUFFER: &str = "Buffer";
pub const SET: &str = "Set";
pub const MAP: &str = "Map";

/// Built-in descriptors in match order.
pub fn descriptors() -> Vec<Arc<dyn TypeCodec>> {
    vec![
        Arc::new(date()),
        Arc::new(buffer()),
        Arc::new(set()),
        Arc::new(map()),
    ]
}

pub fn date() -> TypeDescriptor<DateTime<Utc>> {
    TypeDescriptor::new(DATE, encode_date, decode_date)
}

/// Fails on instants finer than a millisecond, which the wire form cannot hold.
fn encode_date(date: &DateTime<Utc>) -> Result<JsonValue, DescriptorError> {
    let nanos = date.timestamp_subsec_nanos() % 1_000_000;
    if nanos != 0 {
        return Err(DescriptorError::Invalid {
            what: "timestamp",
            reason: format!("{date:?} carries {nanos} ns below millisecond precision"),
        });
    }
    Ok(JsonValue::from(date.timestamp_millis()))
}

fn decode_date(plain: JsonValue) -> Result<DateTime<Utc>, DescriptorError> {
    let millis = match &plain {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
    .ok_or_else(|| DescriptorError::invalid_plain("integer milliseconds", &plain))?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| DescriptorError::Invalid {
        what: "timestamp",
        reason: format!("{millis} ms is out of range"),
    })
}

pub fn buffer() -> TypeDescriptor<Vec<u8>> {
    TypeDescriptor::new(
        BUFFER,
        |bytes: &Vec<u8>| Ok(JsonValue::String(STANDARD.encode(bytes))),
        |plain| match plain {
            JsonValue::String(encoded) => {
                STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| DescriptorError::Invalid {
                        what: "base64",
                        reason: e.to_string(),
                    })
            }
            other => Err(DescriptorError::invalid_plain("base64 string", &other)),
        },
    )
}

pub fn set() -> TypeDescriptor<ValueSet> {
    TypeDescriptor::new(
        SET,
        |set: &ValueSet| {
            set.iter()
                .map(Value::to_plain)
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array)
        },
        |plain| match plain {
            JsonValue::Array(items) => Ok(items.into_iter().map(Value::from).collect()),
            other => Err(DescriptorError::invalid_plain("array", &other)),
        },
    )
}

pub fn map() -> TypeDescriptor<ValueMap> {
    TypeDescriptor::new(
        MAP,
        |map: &ValueMap| {
            let mut pairs = Vec::with_capacity(map.len());
            for (key, value) in map.iter() {
                pairs.push(JsonValue::Array(vec![key.to_plain()?, value.to_plain()?]));
            }
            Ok(JsonValue::Array(pairs))
        },
        |plain| {
            let pairs = match plain {
                JsonValue::Array(pairs) => pairs,
                other => return Err(DescriptorError::invalid_plain("array of pairs", &other)),
            };
            let mut map = ValueMap::new();
            for pair in pairs {
                match pair {
                    JsonValue::Array(kv) if kv.len() == 2 => {
                        let mut kv = kv.into_iter();
                        if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
                            map.insert(Value::from(key), Value::from(value));
                        }
                    }
                    other => {
                        return Err(DescriptorError::invalid_plain("[key, value] pair", &other))
                    }
                }
            }
            Ok(map)
        },
    )
}

/// Insertion-ordered collection of distinct values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    items: Vec<Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` unless an equal element is present. Returns whether it was added.
    pub fn insert(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<V: Into<Value>> FromIterator<V> for ValueSet {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

/// Insertion-ordered mapping with arbitrary value keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::instance(date)
    }
}

impl From<ValueSet> for Value {
    fn from(set: ValueSet) -> Self {
        Value::instance(set)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::instance(map)
    }
}
