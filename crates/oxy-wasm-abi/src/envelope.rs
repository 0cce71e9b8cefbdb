// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tagged request/response messages for the host boundary.
//!
//! Every response is an [`Envelope`]: either `ok` with a payload or `err`
//! with an [`AbiError`]. The host never has to probe for optional properties.

use crate::{ABI_VERSION, FeatureDto, RecordId, query::{Detail, FilterSpec}};
use serde::{Deserialize, Serialize};

/// Stable, host-visible error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Container magic/version/flags missing or unrecognized.
    BadHeader,
    /// A frame or field ran past the end of the input.
    Truncated,
    /// Zero coordinates, an open polygon ring, or a non-finite coordinate.
    MalformedGeometry,
    /// Any other byte-level defect inside a feature.
    MalformedRecord,
    /// A numeric, time, or spatial range with `min > max`.
    InvalidRange,
    /// Strict mode: attribute name absent from the dataset schema.
    UnknownAttribute,
    /// Export id does not exist in the dataset.
    UnknownId,
    /// Export format tag not recognized.
    UnsupportedFormat,
    /// Request message could not be decoded or has the wrong ABI version.
    BadRequest,
    /// Unexpected failure inside the core (e.g. an output writer error).
    Internal,
}

/// Error payload: code plus a human-readable message for the end user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiError {
    /// Error code.
    pub code: ErrorCode,
    /// Message suitable for display.
    pub message: String,
}

impl AbiError {
    /// Construct an error payload.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Tagged response wrapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Envelope<T> {
    /// Operation succeeded.
    Ok {
        /// ABI version of this message.
        abi_version: u16,
        /// Payload.
        value: T,
    },
    /// Operation failed; state is unchanged.
    Err {
        /// ABI version of this message.
        abi_version: u16,
        /// Error payload.
        error: AbiError,
    },
}

impl<T> Envelope<T> {
    /// Wrap a successful payload.
    pub const fn ok(value: T) -> Self {
        Self::Ok {
            abi_version: ABI_VERSION,
            value,
        }
    }

    /// Wrap an error.
    pub const fn err(error: AbiError) -> Self {
        Self::Err {
            abi_version: ABI_VERSION,
            error,
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<T, AbiError> {
        match self {
            Self::Ok { value, .. } => Ok(value),
            Self::Err { error, .. } => Err(error),
        }
    }
}

impl<T, E: Into<AbiError>> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => Self::err(e.into()),
        }
    }
}

/// Successful load summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResponse {
    /// Number of records now active.
    pub records: u32,
    /// Sorted attribute names observed in the dataset.
    pub schema: Vec<String>,
}

/// Filter request from the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    /// Must equal [`ABI_VERSION`].
    pub abi_version: u16,
    /// Query.
    #[serde(default)]
    pub spec: FilterSpec,
    /// Response verbosity.
    #[serde(default)]
    pub detail: Detail,
}

/// Filter result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterResponse {
    /// Matching ids in the requested order.
    pub ids: Vec<RecordId>,
    /// Features in the same order as `ids`, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<FeatureDto>>,
}

/// Export request from the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Must equal [`ABI_VERSION`].
    pub abi_version: u16,
    /// Ids in output row order; duplicates produce duplicate rows.
    pub ids: Vec<RecordId>,
    /// Format tag (`"csv"` or `"structured"`).
    pub format: String,
}

/// Export result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    /// Canonical format name that was written.
    pub format: String,
    /// Suggested MIME type for the download.
    pub mime: String,
    /// Output document.
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

/// Informational engine statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Whether a dataset is loaded.
    pub loaded: bool,
    /// Record count.
    pub records: u32,
    /// Spatial index node count.
    pub index_nodes: u32,
    /// Spatial index depth.
    pub index_depth: u32,
    /// Approximate heap footprint in bytes.
    pub memory_bytes: u64,
}
