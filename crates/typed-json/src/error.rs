//! Error types for encoding and decoding.

use serde_json::Value as JsonValue;
use thiserror::Error;
use typed_json_path::Path;

use crate::tree::TreeError;

/// Failure inside a single type descriptor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptorError {
    /// The plain form handed to `decode` has the wrong JSON kind.
    #[error("expected {expected}, found {found}")]
    InvalidPlain {
        expected: &'static str,
        found: &'static str,
    },
    /// The plain form has the right kind but its content is unusable.
    #[error("invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },
    /// The descriptor was asked to encode an instance of a type it does not handle.
    #[error("descriptor for `{expected}` cannot encode `{found}`")]
    Unsupported {
        expected: &'static str,
        found: &'static str,
    },
    /// A collection member is itself a typed instance.
    #[error("`{type_name}` inside a collection is not plain data")]
    NestedInstance { type_name: &'static str },
    #[error("{0}")]
    Custom(String),
}

impl DescriptorError {
    pub fn custom(message: impl Into<String>) -> Self {
        DescriptorError::Custom(message.into())
    }

    pub(crate) fn invalid_plain(expected: &'static str, found: &JsonValue) -> Self {
        DescriptorError::InvalidPlain {
            expected,
            found: json_kind(found),
        }
    }
}

/// Errors raised by `Codec::serialize`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("no registered type matches `{type_name}` at `{path}`")]
    Unsupported { path: Path, type_name: &'static str },
    #[error("cannot encode `{name}` at `{path}`: {source}")]
    Descriptor {
        path: Path,
        name: String,
        #[source]
        source: DescriptorError,
    },
    #[error("root object already holds the reserved key `{key}`")]
    ReservedKey { key: &'static str },
    #[error("typed values need an object root to carry metadata, found {found}")]
    RootNotObject { found: &'static str },
    #[error("nesting deeper than {max_depth} levels at `{path}`")]
    DepthExceeded { path: Path, max_depth: usize },
    #[error("cannot write metadata: {reason}")]
    Metadata { reason: String },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors raised by `Codec::deserialize`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("serializer does not exist: type={name}")]
    UnknownType { name: String },
    #[error("metadata references `{path}`, which is missing from the tree")]
    ShapeMismatch { path: Path },
    #[error("malformed metadata: {reason}")]
    MalformedMetadata { reason: String },
    #[error("cannot decode `{name}` at `{path}`: {source}")]
    Descriptor {
        path: Path,
        name: String,
        #[source]
        source: DescriptorError,
    },
    #[error("nesting deeper than {max_depth} levels at `{path}`")]
    DepthExceeded { path: Path, max_depth: usize },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl DecodeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DecodeError::MalformedMetadata {
            reason: reason.into(),
        }
    }
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
