// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Binary feature container framing (.oxyf).
//!
//! Layout (v1):
//! Header (8 bytes):
//! - Magic: "OXYF" (4 bytes)
//! - Version: u16 LE (2 bytes) = 1
//! - Flags: u16 LE (2 bytes) = 0
//!
//! Frames (Repeated until end of buffer):
//! - Length: u32 LE (4 bytes)
//! - Payload: [u8; Length] (one feature, see below)
//!
//! Feature payload:
//! - Geometry tag: u8 ([`GeometryType`])
//! - Coordinate count: u32 LE, then `count` x (f64 LE x, f64 LE y)
//! - Timestamp flag: u8 ([`TIMESTAMP_ABSENT`] / [`TIMESTAMP_PRESENT`]), then i64 LE if present
//! - Attribute count: u16 LE, then per attribute a u32-prefixed UTF-8 key,
//!   a value tag ([`VALUE_TAG_STR`], [`VALUE_TAG_NUM`], [`VALUE_TAG_BOOL`]),
//!   and the value (u32-prefixed UTF-8, f64 LE, or a 0/1 byte).

use crate::codec::{CodecError, Reader, Writer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Magic bytes identifying a feature container: "OXYF".
pub const CONTAINER_MAGIC: [u8; 4] = *b"OXYF";
/// Current container format version.
pub const CONTAINER_VERSION: u16 = 1;
/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 8;
/// Maximum allowed frame length (16 MiB).
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
/// Maximum attribute key length in bytes.
pub const MAX_KEY_LEN: usize = 1024;
/// Maximum string attribute length in bytes.
pub const MAX_STR_LEN: usize = 64 * 1024;

/// Timestamp flag: no timestamp follows.
pub const TIMESTAMP_ABSENT: u8 = 0;
/// Timestamp flag: an i64 timestamp follows.
pub const TIMESTAMP_PRESENT: u8 = 1;

/// Attribute value tag: u32-prefixed UTF-8 string.
pub const VALUE_TAG_STR: u8 = 0;
/// Attribute value tag: f64 number.
pub const VALUE_TAG_NUM: u8 = 1;
/// Attribute value tag: boolean byte.
pub const VALUE_TAG_BOOL: u8 = 2;

/// Geometry type as tagged on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GeometryType {
    /// Exactly one coordinate.
    Point = 0,
    /// Open polyline.
    LineString = 1,
    /// Single closed ring.
    Polygon = 2,
}

impl GeometryType {
    /// Parse a wire tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Point),
            1 => Some(Self::LineString),
            2 => Some(Self::Polygon),
            _ => None,
        }
    }

    /// Wire tag for this type.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Display name, as used in exports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        }
    }
}

/// Container framing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    /// Fewer than [`HEADER_LEN`] bytes were supplied.
    #[error("header too short: {0} bytes")]
    ShortHeader(usize),
    /// Magic bytes did not match [`CONTAINER_MAGIC`].
    #[error("bad container magic")]
    BadMagic,
    /// Version is not [`CONTAINER_VERSION`].
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u16),
    /// Flags are reserved and must be zero.
    #[error("container flags must be zero, got {0:#06x}")]
    NonZeroFlags(u16),
    /// A frame declared more bytes than the buffer holds.
    #[error("frame declares {declared} bytes but only {remaining} remain")]
    FrameTruncated {
        /// Declared payload length.
        declared: usize,
        /// Bytes left after the length prefix.
        remaining: usize,
    },
    /// A frame exceeded [`MAX_FRAME_LEN`].
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),
    /// Writer-side encoding failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Parsed container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Format version (always [`CONTAINER_VERSION`] once validated).
    pub version: u16,
    /// Reserved flags (always 0 once validated).
    pub flags: u16,
}

/// Reads and validates a container header.
///
/// # Errors
/// Returns an error if the buffer is too short, the magic bytes are wrong,
/// the version is unsupported, or flags are set.
pub fn read_header(r: &mut Reader<'_>) -> Result<ContainerHeader, ContainerError> {
    if r.remaining() < HEADER_LEN {
        return Err(ContainerError::ShortHeader(r.remaining()));
    }
    let magic = r.take(4)?;
    if magic != CONTAINER_MAGIC {
        return Err(ContainerError::BadMagic);
    }
    let version = r.read_u16_le()?;
    if version != CONTAINER_VERSION {
        return Err(ContainerError::UnsupportedVersion(version));
    }
    let flags = r.read_u16_le()?;
    if flags != 0 {
        return Err(ContainerError::NonZeroFlags(flags));
    }
    Ok(ContainerHeader { version, flags })
}

/// Writes a version-1 header with zero flags.
pub fn write_header(w: &mut Writer) {
    w.write_bytes(&CONTAINER_MAGIC);
    w.write_u16_le(CONTAINER_VERSION);
    w.write_u16_le(0);
}

/// Reads a single frame payload.
///
/// Returns `Ok(None)` once the buffer is exhausted at a frame boundary.
///
/// # Errors
/// Returns an error if the length prefix is cut short, the declared length
/// exceeds the remaining bytes, or the frame is larger than [`MAX_FRAME_LEN`].
pub fn read_frame<'a>(r: &mut Reader<'a>) -> Result<Option<&'a [u8]>, ContainerError> {
    if r.is_exhausted() {
        return Ok(None);
    }
    let declared = r.read_u32_le().map_err(|_| ContainerError::FrameTruncated {
        declared: 4,
        remaining: r.remaining(),
    })? as usize;
    if declared > r.remaining() {
        return Err(ContainerError::FrameTruncated {
            declared,
            remaining: r.remaining(),
        });
    }
    if declared > MAX_FRAME_LEN {
        return Err(ContainerError::FrameTooLarge(declared));
    }
    Ok(Some(r.take(declared)?))
}

/// Writes a single frame.
///
/// # Errors
/// Returns an error if the frame exceeds [`MAX_FRAME_LEN`].
pub fn write_frame(w: &mut Writer, payload: &[u8]) -> Result<(), ContainerError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ContainerError::FrameTooLarge(payload.len()));
    }
    w.write_len_prefixed_bytes(payload)?;
    Ok(())
}
