// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! FlatGeobuf ingest.
//!
//! The offline preprocessing step writes FlatGeobuf; [`crate::decode`]
//! routes here when the input starts with the FlatGeobuf magic. Supported
//! geometries are single-part: points, line strings, and polygons (exterior
//! ring only; holes are dropped). An integral `timestamp` column becomes the
//! record timestamp. Every other column becomes an attribute.
//!
//! Errors map onto the same taxonomy as the native container: magic, version
//! and header failures are `BadHeader`, an unreadable feature buffer is
//! `Truncated`, and geometry or column defects are `MalformedGeometry` /
//! `MalformedRecord`.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Cursor;

use flatgeobuf::{FallibleStreamingIterator, FgbFeature, FgbReader, GeometryType as FgbType};
use geozero::{ColumnValue, FeatureProperties, PropertyProcessor};
use oxy_geom::Coord;
use oxy_wasm_abi::container::MAX_STR_LEN;
use oxy_wasm_abi::{GeometryType, RecordId, Value};
use tracing::debug;

use crate::decode::finite_num;
use crate::error::DecodeError;
use crate::model::{Dataset, EventRecord, Geometry};

/// Leading bytes shared by every FlatGeobuf version.
const MAGIC_PREFIX: &[u8; 3] = b"fgb";

/// Full magic is `fgb`, major version, `fgb`, patch.
const MAGIC_LEN: usize = 8;

/// Only the current major version is read.
const MAJOR_VERSION: u8 = 3;

/// Column lifted into [`EventRecord::timestamp`] when its value is integral.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Returns `true` when `bytes` claims to be FlatGeobuf.
pub(crate) fn is_flatgeobuf(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC_PREFIX)
}

fn check_magic(bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.len() < MAGIC_LEN {
        return Err(DecodeError::BadHeader(format!(
            "{} bytes is shorter than the FlatGeobuf magic",
            bytes.len()
        )));
    }
    if &bytes[4..7] != MAGIC_PREFIX {
        return Err(DecodeError::BadHeader("bad FlatGeobuf magic".into()));
    }
    if bytes[3] != MAJOR_VERSION {
        return Err(DecodeError::BadHeader(format!(
            "unsupported FlatGeobuf version {}",
            bytes[3]
        )));
    }
    Ok(())
}

fn bad_header(e: impl Display) -> DecodeError {
    DecodeError::BadHeader(e.to_string())
}

/// Decode a FlatGeobuf buffer, rejecting it once more than `max_records` features appear.
pub(crate) fn decode(bytes: &[u8], max_records: usize) -> Result<Dataset, DecodeError> {
    check_magic(bytes)?;
    let reader = FgbReader::open(Cursor::new(bytes)).map_err(bad_header)?;
    let header_kind = reader.header().geometry_type();
    let declared = reader.header().features_count();
    match usize::try_from(declared) {
        Ok(n) if n <= max_records => {}
        _ => {
            return Err(DecodeError::MalformedRecord(format!(
                "header declares {declared} features, limit is {max_records}"
            )))
        }
    }
    let mut features = reader.select_all().map_err(bad_header)?;

    let mut records = Vec::new();
    loop {
        let index = records.len();
        let Some(feature) = features
            .next()
            .map_err(|e| DecodeError::Truncated(format!("feature {index}: {e}")))?
        else {
            break;
        };
        if index >= max_records {
            return Err(DecodeError::MalformedRecord(format!(
                "more than {max_records} records"
            )));
        }
        let record =
            decode_feature(feature, header_kind, index).map_err(|e| e.at_feature(index))?;
        records.push(record);
    }
    debug!(records = records.len(), bytes = bytes.len(), "flatgeobuf decoded");
    Ok(Dataset::new(records))
}

fn decode_feature(
    feature: &FgbFeature,
    header_kind: FgbType,
    index: usize,
) -> Result<EventRecord, DecodeError> {
    let geom = feature
        .geometry()
        .ok_or_else(|| DecodeError::MalformedGeometry("feature has no geometry".into()))?;
    let kind = if header_kind == FgbType::Unknown {
        geom.type_()
    } else {
        header_kind
    };
    let xy: Vec<f64> = geom.xy().map(|v| v.iter().collect()).unwrap_or_default();
    let ends: Vec<u32> = geom.ends().map(|v| v.iter().collect()).unwrap_or_default();
    let geometry = geometry_from_parts(kind, &xy, &ends)?;

    let mut columns = Columns::default();
    feature
        .process_properties(&mut columns)
        .map_err(|e| DecodeError::MalformedRecord(e.to_string()))?;
    if let Some(e) = columns.error {
        return Err(e);
    }

    let id = RecordId::try_from(index)
        .map_err(|_| DecodeError::MalformedRecord("record id exceeds u32".into()))?;
    Ok(EventRecord {
        id,
        geometry,
        timestamp: columns.timestamp,
        attributes: columns.attributes,
    })
}

/// Build a [`Geometry`] from a flat `x, y, x, y, ...` buffer.
///
/// `ends` holds ring end offsets in coordinate pairs; only the first ring of
/// a polygon is kept.
fn geometry_from_parts(
    kind: FgbType,
    xy: &[f64],
    ends: &[u32],
) -> Result<Geometry, DecodeError> {
    let kind = match kind {
        FgbType::Point => GeometryType::Point,
        FgbType::LineString => GeometryType::LineString,
        FgbType::Polygon => GeometryType::Polygon,
        other => {
            return Err(DecodeError::MalformedGeometry(format!(
                "unsupported geometry type {}",
                other.0
            )))
        }
    };
    if xy.len() % 2 != 0 {
        return Err(DecodeError::MalformedGeometry(format!(
            "odd coordinate buffer length {}",
            xy.len()
        )));
    }
    let pairs = xy.len() / 2;
    let take = match (kind, ends.first()) {
        (GeometryType::Polygon, Some(&end)) => {
            let end = end as usize;
            if end > pairs {
                return Err(DecodeError::MalformedGeometry(format!(
                    "ring ends at {end} of {pairs} coordinates"
                )));
            }
            end
        }
        _ => pairs,
    };
    let coords = xy
        .chunks_exact(2)
        .take(take)
        .map(|p| Coord::new(p[0], p[1]))
        .collect();
    Geometry::new(kind, coords)
}

/// Collects one feature's columns. The first defect stops the walk and is
/// reported after it.
#[derive(Debug, Default)]
struct Columns {
    attributes: BTreeMap<String, Value>,
    timestamp: Option<i64>,
    error: Option<DecodeError>,
}

impl Columns {
    #[allow(clippy::cast_precision_loss)]
    fn accept(&mut self, name: &str, value: &ColumnValue<'_>) -> Result<(), DecodeError> {
        if name == TIMESTAMP_COLUMN {
            if let Some(ts) = integral(value) {
                self.timestamp = Some(ts);
                return Ok(());
            }
        }
        let value = match *value {
            ColumnValue::Bool(b) => Value::Bool(b),
            ColumnValue::Byte(n) => Value::Num(f64::from(n)),
            ColumnValue::UByte(n) => Value::Num(f64::from(n)),
            ColumnValue::Short(n) => Value::Num(f64::from(n)),
            ColumnValue::UShort(n) => Value::Num(f64::from(n)),
            ColumnValue::Int(n) => Value::Num(f64::from(n)),
            ColumnValue::UInt(n) => Value::Num(f64::from(n)),
            ColumnValue::Long(n) => Value::Num(n as f64),
            ColumnValue::ULong(n) => Value::Num(n as f64),
            ColumnValue::Float(n) => finite_num(f64::from(n))?,
            ColumnValue::Double(n) => finite_num(n)?,
            ColumnValue::String(s) | ColumnValue::Json(s) | ColumnValue::DateTime(s) => {
                if s.len() > MAX_STR_LEN {
                    return Err(DecodeError::MalformedRecord(format!(
                        "column {name:?} is {} bytes",
                        s.len()
                    )));
                }
                Value::Str(s.to_owned())
            }
            ColumnValue::Binary(_) => return Ok(()),
        };
        if self.attributes.insert(name.to_owned(), value).is_some() {
            return Err(DecodeError::MalformedRecord(format!(
                "duplicate attribute {name:?}"
            )));
        }
        Ok(())
    }
}

impl PropertyProcessor for Columns {
    fn property(
        &mut self,
        _idx: usize,
        name: &str,
        value: &ColumnValue<'_>,
    ) -> geozero::error::Result<bool> {
        match self.accept(name, value) {
            Ok(()) => Ok(false),
            Err(e) => {
                self.error = Some(e);
                Ok(true)
            }
        }
    }
}

fn integral(value: &ColumnValue<'_>) -> Option<i64> {
    match *value {
        ColumnValue::Byte(n) => Some(i64::from(n)),
        ColumnValue::UByte(n) => Some(i64::from(n)),
        ColumnValue::Short(n) => Some(i64::from(n)),
        ColumnValue::UShort(n) => Some(i64::from(n)),
        ColumnValue::Int(n) => Some(i64::from(n)),
        ColumnValue::UInt(n) => Some(i64::from(n)),
        ColumnValue::Long(n) => Some(n),
        ColumnValue::ULong(n) => i64::try_from(n).ok(),
        _ => None,
    }
}
