//! Type-preserving structural codec for JSON.
//!
//! [`Codec::serialize`] turns a [`Value`] graph that may hold dates, byte
//! buffers, sets, maps or any registered user type into plain JSON. Typed
//! leaves are not tagged inline; instead one `__t` entry on the root object
//! records a de-duplicated type-name table and an index tree locating every
//! typed leaf. [`Codec::deserialize`] inverts this exactly, keeping key order
//! and array positions.
//!
//! ```
//! use chrono::DateTime;
//! use serde_json::json;
//! use typed_json::{Codec, Value};
//!
//! let codec = Codec::new();
//! let when = DateTime::from_timestamp_millis(1_682_380_800_000).unwrap();
//! let value: Value = [("Date", Value::from(when))].into_iter().collect();
//!
//! let plain = codec.serialize(&value).unwrap();
//! assert_eq!(
//!     plain,
//!     json!({"Date": 1_682_380_800_000i64, "__t": {"t": ["Date"], "i": {"Date": 0}}})
//! );
//! assert_eq!(codec.deserialize(plain).unwrap(), value);
//! ```

pub mod builtins;
mod codec;
mod error;
pub mod flatten;
pub mod index;
mod metadata;
mod registry;
pub mod tree;
mod value;

pub use builtins::{ValueMap, ValueSet};
pub use codec::{Codec, CodecOptions};
pub use error::{DecodeError, DescriptorError, EncodeError};
pub use metadata::{Metadata, METADATA_KEY, METADATA_VERSION};
pub use registry::{TypeCodec, TypeDescriptor, TypeRegistry};
pub use tree::{TreeBuilder, TreeError};
pub use typed_json_path::{Path, PathSegment};
pub use value::{Instance, Object, Value};
