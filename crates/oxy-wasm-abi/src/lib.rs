// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire layer shared by the Oxy core and its WASM host bridge.
//!
//! This crate is intentionally small and **WASM-friendly**:
//!
//! - [`codec`] and [`container`] define the fixed, versioned binary feature
//!   container produced by the offline preprocessing step.
//! - The DTOs below and in [`query`] / [`envelope`] are the only shapes that
//!   cross the JS boundary. They travel as CBOR (see [`encode_cbor`]) rather
//!   than as ad hoc JS objects, and every message carries [`ABI_VERSION`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod codec;
pub mod container;
pub mod envelope;
pub mod query;

pub use container::GeometryType;
pub use envelope::{AbiError, Envelope, ErrorCode};
pub use query::{AttributePredicate, Bounds, Detail, FilterSpec, PredicateOp, ResultOrder};

/// Version of the boundary message set. Bumped on any incompatible change.
pub const ABI_VERSION: u16 = 1;

/// Record identifier: position of the feature in its container (0-based).
pub type RecordId = u32;

/// Typed scalar attribute value.
///
/// Serialized as `{ "kind": "...", "value": ... }` to make the JS-side shape explicit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    /// UTF-8 string value.
    Str(String),
    /// 64-bit float.
    Num(f64),
    /// Boolean value.
    Bool(bool),
}

impl Value {
    /// Numeric payload, if this is a number.
    #[must_use]
    pub const fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Num(_) => "number",
            Self::Bool(_) => "boolean",
        }
    }
}

/// Geometry as exchanged with the host: a type plus `[x, y]` pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryDto {
    /// Geometry type.
    #[serde(rename = "type")]
    pub kind: GeometryType,
    /// Ordered coordinate pairs.
    pub coordinates: Vec<[f64; 2]>,
}

/// One materialized feature.
///
/// Used for verbose filter responses and for the structured export format.
/// `attributes` is a `BTreeMap` so serialized key order is stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureDto {
    /// Record id.
    pub id: RecordId,
    /// Geometry.
    pub geometry: GeometryDto,
    /// Timestamp, `None` when the record has none.
    pub timestamp: Option<i64>,
    /// Attribute map.
    pub attributes: BTreeMap<String, Value>,
}

/// Errors from CBOR encoding/decoding of boundary messages.
#[derive(Debug, Error)]
pub enum AbiCodecError {
    /// Serialization failed.
    #[error("cbor encode: {0}")]
    Encode(String),
    /// Input was not a valid message.
    #[error("cbor decode: {0}")]
    Decode(String),
}

/// Encode a boundary message as CBOR.
pub fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, AbiCodecError> {
    let mut out = Vec::new();
    ciborium::into_writer(value, &mut out).map_err(|e| AbiCodecError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode a boundary message from CBOR bytes.
pub fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AbiCodecError> {
    ciborium::from_reader(bytes).map_err(|e| AbiCodecError::Decode(e.to_string()))
}
