// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference container encoder.
//!
//! Produces exactly the bytes [`crate::decode`] accepts. Used by tests,
//! benches, and hosts that want to build containers from Rust.

use oxy_wasm_abi::codec::Writer;
use oxy_wasm_abi::container::{
    self, MAX_KEY_LEN, MAX_STR_LEN, TIMESTAMP_ABSENT, TIMESTAMP_PRESENT, VALUE_TAG_BOOL,
    VALUE_TAG_NUM, VALUE_TAG_STR,
};
use oxy_wasm_abi::Value;

use crate::error::DecodeError;
use crate::model::EventRecord;

/// Encode records in slice order. Record ids are not written; decoding
/// assigns them by position.
pub fn encode(records: &[EventRecord]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Writer::with_capacity(container::HEADER_LEN + records.len() * 64);
    container::write_header(&mut out);
    for (index, record) in records.iter().enumerate() {
        let mut payload = Writer::default();
        encode_feature(&mut payload, record).map_err(|e| e.at_feature(index))?;
        container::write_frame(&mut out, &payload.into_vec())
            .map_err(|e| DecodeError::from(e).at_feature(index))?;
    }
    Ok(out.into_vec())
}

fn encode_feature(w: &mut Writer, record: &EventRecord) -> Result<(), DecodeError> {
    let coords = record.geometry.coords();
    w.write_u8(record.geometry.kind().tag());
    let count = u32::try_from(coords.len())
        .map_err(|_| DecodeError::MalformedGeometry("too many coordinates".into()))?;
    w.write_u32_le(count);
    for c in coords {
        w.write_f64_le(c.x);
        w.write_f64_le(c.y);
    }
    match record.timestamp {
        Some(ts) => {
            w.write_u8(TIMESTAMP_PRESENT);
            w.write_i64_le(ts);
        }
        None => w.write_u8(TIMESTAMP_ABSENT),
    }
    let attr_count = u16::try_from(record.attributes.len())
        .map_err(|_| DecodeError::MalformedRecord("too many attributes".into()))?;
    w.write_u16_le(attr_count);
    for (key, value) in &record.attributes {
        w.write_string(key, MAX_KEY_LEN)?;
        match value {
            Value::Str(s) => {
                w.write_u8(VALUE_TAG_STR);
                w.write_string(s, MAX_STR_LEN)?;
            }
            Value::Num(n) => {
                if !n.is_finite() {
                    return Err(DecodeError::MalformedRecord(format!(
                        "attribute {key:?} is not finite: {n}"
                    )));
                }
                w.write_u8(VALUE_TAG_NUM);
                w.write_f64_le(*n);
            }
            Value::Bool(b) => {
                w.write_u8(VALUE_TAG_BOOL);
                w.write_u8(u8::from(*b));
            }
        }
    }
    Ok(())
}
