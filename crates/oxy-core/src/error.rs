// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for the core.
//!
//! Every failure is recoverable: a rejected load keeps the previous dataset,
//! and filter/export errors leave state untouched. [`CoreError::code`] is the
//! single mapping onto host-visible [`ErrorCode`]s.

use oxy_wasm_abi::codec::CodecError;
use oxy_wasm_abi::container::ContainerError;
use oxy_wasm_abi::{AbiError, ErrorCode, RecordId};
use thiserror::Error;

/// Container decoding failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Magic, version, or flags missing or unrecognized.
    #[error("bad header: {0}")]
    BadHeader(String),
    /// A declared length runs past the available bytes.
    #[error("truncated: {0}")]
    Truncated(String),
    /// Zero coordinates, an open polygon ring, or a non-finite coordinate.
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
    /// Unknown tags, invalid UTF-8, duplicate keys, trailing bytes, or limits exceeded.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

impl DecodeError {
    /// Prefix the detail with the feature position it came from.
    #[must_use]
    pub fn at_feature(self, index: usize) -> Self {
        match self {
            Self::BadHeader(m) => Self::BadHeader(m),
            Self::Truncated(m) => Self::Truncated(format!("feature {index}: {m}")),
            Self::MalformedGeometry(m) => Self::MalformedGeometry(format!("feature {index}: {m}")),
            Self::MalformedRecord(m) => Self::MalformedRecord(format!("feature {index}: {m}")),
        }
    }
}

impl From<ContainerError> for DecodeError {
    fn from(e: ContainerError) -> Self {
        match e {
            ContainerError::ShortHeader(_)
            | ContainerError::BadMagic
            | ContainerError::UnsupportedVersion(_)
            | ContainerError::NonZeroFlags(_) => Self::BadHeader(e.to_string()),
            ContainerError::FrameTruncated { .. } => Self::Truncated(e.to_string()),
            ContainerError::FrameTooLarge(_) => Self::MalformedRecord(e.to_string()),
            ContainerError::Codec(inner) => inner.into(),
        }
    }
}

impl From<CodecError> for DecodeError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::OutOfBounds { .. } => Self::Truncated(e.to_string()),
            CodecError::InvalidUtf8 | CodecError::StringTooLong | CodecError::LengthTooLarge => {
                Self::MalformedRecord(e.to_string())
            }
        }
    }
}

/// Filter validation failures. Raised before evaluation starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A range with `min > max` (or a NaN bound).
    #[error("invalid range: {0}")]
    InvalidRange(String),
    /// Strict mode: the attribute never occurs in the dataset.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
}

/// Export failures. No partial output is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// Id not present in the dataset.
    #[error("unknown record id: {0}")]
    UnknownId(RecordId),
    /// Format tag not recognized.
    #[error("unsupported export format: {0:?}")]
    UnsupportedFormat(String),
    /// Output writer failed.
    #[error("export write failed: {0}")]
    Write(String),
}

/// Engine configuration failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Leaf size outside `1..=64`.
    #[error("leaf size must be within 1..=64, got {0}")]
    InvalidLeafSize(usize),
    /// Precision above 15 fractional digits.
    #[error("precision must be at most 15, got {0}")]
    InvalidPrecision(usize),
    /// Record limit of zero or beyond `u32` range.
    #[error("max records must be within 1..=4294967295, got {0}")]
    InvalidMaxRecords(usize),
    /// Config blob could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
}

/// Umbrella error for [`crate::Session`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Load failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Filter failed.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// Export failed.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Boundary request could not be understood.
    #[error("bad request: {0}")]
    Request(String),
}

impl CoreError {
    /// Host-visible error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Decode(DecodeError::BadHeader(_)) => ErrorCode::BadHeader,
            Self::Decode(DecodeError::Truncated(_)) => ErrorCode::Truncated,
            Self::Decode(DecodeError::MalformedGeometry(_)) => ErrorCode::MalformedGeometry,
            Self::Decode(DecodeError::MalformedRecord(_)) => ErrorCode::MalformedRecord,
            Self::Filter(FilterError::InvalidRange(_)) => ErrorCode::InvalidRange,
            Self::Filter(FilterError::UnknownAttribute(_)) => ErrorCode::UnknownAttribute,
            Self::Export(ExportError::UnknownId(_)) => ErrorCode::UnknownId,
            Self::Export(ExportError::UnsupportedFormat(_)) => ErrorCode::UnsupportedFormat,
            Self::Export(ExportError::Write(_)) => ErrorCode::Internal,
            Self::Config(_) | Self::Request(_) => ErrorCode::BadRequest,
        }
    }
}

impl From<CoreError> for AbiError {
    fn from(e: CoreError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_errors_map_onto_decode_taxonomy() {
        assert!(matches!(
            DecodeError::from(ContainerError::BadMagic),
            DecodeError::BadHeader(_)
        ));
        assert!(matches!(
            DecodeError::from(ContainerError::FrameTruncated {
                declared: 10,
                remaining: 2
            }),
            DecodeError::Truncated(_)
        ));
        assert!(matches!(
            DecodeError::from(ContainerError::FrameTooLarge(1 << 30)),
            DecodeError::MalformedRecord(_)
        ));
    }

    #[test]
    fn abi_error_keeps_message() {
        let abi: AbiError = CoreError::from(FilterError::InvalidRange("time 300 > 100".into())).into();
        assert_eq!(abi.code, ErrorCode::InvalidRange);
        assert_eq!(abi.message, "invalid range: time 300 > 100");
    }
}
