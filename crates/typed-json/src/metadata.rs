//! Wire form of the root-level side-channel.
//!
//! ```text
//! root := PlainValue & { "__t"?: { "t": string[], "i": IndexTree, "v"?: 1 } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{DecodeError, EncodeError};

/// Reserved root key carrying [`Metadata`]. Only ever present on the root object.
pub const METADATA_KEY: &str = "__t";

/// The only side-channel version this crate reads.
pub const METADATA_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Distinct type names in first-use order.
    #[serde(rename = "t")]
    pub type_names: Vec<String>,
    /// Index tree; every leaf is a position in `type_names`.
    #[serde(rename = "i")]
    pub index: JsonValue,
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl Metadata {
    pub fn new(type_names: Vec<String>, index: JsonValue) -> Self {
        Self {
            type_names,
            index,
            version: None,
        }
    }

    pub fn to_json(&self) -> Result<JsonValue, EncodeError> {
        serde_json::to_value(self).map_err(|e| EncodeError::Metadata {
            reason: e.to_string(),
        })
    }

    /// Parses and checks the side-channel taken off a root object.
    pub fn from_json(raw: JsonValue) -> Result<Self, DecodeError> {
        let meta: Metadata =
            serde_json::from_value(raw).map_err(|e| DecodeError::malformed(e.to_string()))?;
        match meta.version {
            None | Some(METADATA_VERSION) => Ok(meta),
            Some(other) => Err(DecodeError::malformed(format!(
                "unsupported metadata version {other}"
            ))),
        }
    }

    /// Name at table position `position`.
    pub fn type_name(&self, position: usize) -> Result<&str, DecodeError> {
        self.type_names
            .get(position)
            .map(String::as_str)
            .ok_or_else(|| {
                DecodeError::malformed(format!(
                    "type position {position} is outside a table of {}",
                    self.type_names.len()
                ))
            })
    }
}
