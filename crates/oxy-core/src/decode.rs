// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Feature container decoder.
//!
//! Pure function of its input: validates the header, then walks frames in
//! order, producing one [`EventRecord`] per frame. FlatGeobuf input is
//! recognised by its magic and handed to [`crate::fgb`]. The spatial index
//! is not built here; see [`Dataset::build_index`].

use std::collections::BTreeMap;

use oxy_geom::Coord;
use oxy_wasm_abi::codec::Reader;
use oxy_wasm_abi::container::{
    self, MAX_KEY_LEN, MAX_STR_LEN, TIMESTAMP_ABSENT, TIMESTAMP_PRESENT, VALUE_TAG_BOOL,
    VALUE_TAG_NUM, VALUE_TAG_STR,
};
use oxy_wasm_abi::{GeometryType, RecordId, Value};
use tracing::debug;

use crate::error::DecodeError;
use crate::fgb;
use crate::model::{Dataset, EventRecord, Geometry};

/// Bytes per encoded coordinate pair.
const COORD_LEN: usize = 16;

/// Decode a container into a dataset with no record limit beyond `u32` ids.
///
/// Zero-length input and a header with no frames both decode to an empty
/// dataset.
pub fn decode(bytes: &[u8]) -> Result<Dataset, DecodeError> {
    decode_with_limit(bytes, u32::MAX as usize)
}

/// Decode a container, rejecting it once more than `max_records` features appear.
pub fn decode_with_limit(bytes: &[u8], max_records: usize) -> Result<Dataset, DecodeError> {
    if bytes.is_empty() {
        return Ok(Dataset::default());
    }
    if fgb::is_flatgeobuf(bytes) {
        return fgb::decode(bytes, max_records);
    }
    let mut reader = Reader::new(bytes);
    container::read_header(&mut reader)?;

    let mut records = Vec::new();
    while let Some(payload) =
        container::read_frame(&mut reader).map_err(|e| DecodeError::from(e).at_feature(records.len()))?
    {
        let index = records.len();
        if index >= max_records {
            return Err(DecodeError::MalformedRecord(format!(
                "more than {max_records} records"
            )));
        }
        let record = decode_feature(payload, index).map_err(|e| e.at_feature(index))?;
        records.push(record);
    }
    debug!(records = records.len(), bytes = bytes.len(), "container decoded");
    Ok(Dataset::new(records))
}

fn decode_feature(payload: &[u8], index: usize) -> Result<EventRecord, DecodeError> {
    let mut r = Reader::new(payload);

    let tag = r.read_u8()?;
    let kind = GeometryType::from_tag(tag)
        .ok_or_else(|| DecodeError::MalformedRecord(format!("unknown geometry tag {tag}")))?;

    let count = r.read_u32_le()? as usize;
    if count == 0 {
        return Err(DecodeError::MalformedGeometry("coordinate count is zero".into()));
    }
    let needed = count.saturating_mul(COORD_LEN);
    if needed > r.remaining() {
        return Err(DecodeError::Truncated(format!(
            "{count} coordinates need {needed} bytes, {} left",
            r.remaining()
        )));
    }
    let mut coords = Vec::with_capacity(count);
    for _ in 0..count {
        let x = r.read_f64_le()?;
        let y = r.read_f64_le()?;
        coords.push(Coord::new(x, y));
    }
    let geometry = Geometry::new(kind, coords)?;

    let timestamp = match r.read_u8()? {
        TIMESTAMP_ABSENT => None,
        TIMESTAMP_PRESENT => Some(r.read_i64_le()?),
        other => {
            return Err(DecodeError::MalformedRecord(format!(
                "unknown timestamp flag {other}"
            )))
        }
    };

    let attr_count = r.read_u16_le()?;
    let mut attributes = BTreeMap::new();
    for _ in 0..attr_count {
        let key = r.read_string(MAX_KEY_LEN)?;
        let value = read_value(&mut r)?;
        if attributes.contains_key(&key) {
            return Err(DecodeError::MalformedRecord(format!(
                "duplicate attribute {key:?}"
            )));
        }
        attributes.insert(key, value);
    }

    if !r.is_exhausted() {
        return Err(DecodeError::MalformedRecord(format!(
            "{} trailing bytes",
            r.remaining()
        )));
    }

    let id = RecordId::try_from(index)
        .map_err(|_| DecodeError::MalformedRecord("record id exceeds u32".into()))?;
    Ok(EventRecord {
        id,
        geometry,
        timestamp,
        attributes,
    })
}

fn read_value(r: &mut Reader<'_>) -> Result<Value, DecodeError> {
    match r.read_u8()? {
        VALUE_TAG_STR => Ok(Value::Str(r.read_string(MAX_STR_LEN)?)),
        VALUE_TAG_NUM => finite_num(r.read_f64_le()?),
        VALUE_TAG_BOOL => match r.read_u8()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            b => Err(DecodeError::MalformedRecord(format!("boolean byte {b}"))),
        },
        tag => Err(DecodeError::MalformedRecord(format!("unknown value tag {tag}"))),
    }
}

/// Numeric attributes must be finite; NaN and infinities have no CSV or
/// JSON form that reads back as the same value.
pub(crate) fn finite_num(n: f64) -> Result<Value, DecodeError> {
    if n.is_finite() {
        Ok(Value::Num(n))
    } else {
        Err(DecodeError::MalformedRecord(format!(
            "numeric attribute is not finite: {n}"
        )))
    }
}
