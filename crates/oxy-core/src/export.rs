// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Export writer: CSV and line-delimited JSON.
//!
//! Ids are resolved up front; an unknown id fails the whole export before a
//! single byte is written. Output follows the caller's id order and keeps
//! duplicates.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use oxy_wasm_abi::{FeatureDto, RecordId, Value};
use tracing::debug;

use crate::error::ExportError;
use crate::model::{Dataset, EventRecord};

/// Fixed leading CSV columns.
const CSV_COLUMNS: [&str; 4] = ["id", "geometry_type", "timestamp", "geometry"];

/// Prepended to an attribute column name until it no longer collides.
const ATTR_COLUMN_PREFIX: &str = "attr.";

/// Output encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// One JSON object per line.
    Structured,
}

impl ExportFormat {
    /// Canonical tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Structured => "jsonl",
        }
    }

    /// MIME type for the produced bytes.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Structured => "application/x-ndjson",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "structured" | "jsonl" | "json" => Ok(Self::Structured),
            _ => Err(ExportError::UnsupportedFormat(tag.to_owned())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialize the records named by `ids`.
///
/// `precision` is the number of fractional digits kept for coordinates and
/// numeric attributes.
pub fn write(
    dataset: &Dataset,
    ids: &[RecordId],
    format: ExportFormat,
    precision: usize,
) -> Result<Vec<u8>, ExportError> {
    let records = ids
        .iter()
        .map(|&id| dataset.get(id).ok_or(ExportError::UnknownId(id)))
        .collect::<Result<Vec<_>, _>>()?;
    let bytes = match format {
        ExportFormat::Csv => write_csv(&records, precision)?,
        ExportFormat::Structured => write_jsonl(&records, precision)?,
    };
    debug!(
        format = format.name(),
        records = records.len(),
        bytes = bytes.len(),
        "export written"
    );
    Ok(bytes)
}

/// [`write`] with the format given as a host tag (`"csv"`, `"structured"`, `"jsonl"`).
pub fn write_tagged(
    dataset: &Dataset,
    ids: &[RecordId],
    tag: &str,
    precision: usize,
) -> Result<Vec<u8>, ExportError> {
    write(dataset, ids, tag.parse()?, precision)
}

fn write_csv(records: &[&EventRecord], precision: usize) -> Result<Vec<u8>, ExportError> {
    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.attributes.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_writer(Vec::new());
    let attr_columns = attribute_columns(&keys);
    wtr.write_record(
        CSV_COLUMNS
            .iter()
            .copied()
            .chain(attr_columns.iter().map(String::as_str)),
    )
    .map_err(write_err)?;

    let mut row: Vec<String> = Vec::with_capacity(CSV_COLUMNS.len() + keys.len());
    for record in records {
        row.clear();
        row.push(record.id.to_string());
        row.push(record.geometry.kind().name().to_owned());
        row.push(record.timestamp.map(|t| t.to_string()).unwrap_or_default());
        row.push(
            record
                .geometry
                .coords()
                .iter()
                .map(|c| {
                    format!(
                        "{} {}",
                        fixed(c.x, precision),
                        fixed(c.y, precision)
                    )
                })
                .collect::<Vec<_>>()
                .join(","),
        );
        for key in &keys {
            row.push(
                record
                    .attribute(key)
                    .map(|v| value_cell(v, precision))
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&row).map_err(write_err)?;
    }
    wtr.into_inner()
        .map_err(|e| ExportError::Write(e.to_string()))
}

/// Header names for the attribute columns, one per key and in key order.
///
/// A key that equals a fixed column, or a name already taken by another
/// attribute, gets [`ATTR_COLUMN_PREFIX`] until it is unique, so the header
/// never repeats a name.
fn attribute_columns(keys: &BTreeSet<&str>) -> Vec<String> {
    let mut taken: BTreeSet<String> = CSV_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
    taken.extend(keys.iter().map(|k| (*k).to_owned()));
    keys.iter()
        .map(|&key| {
            if !CSV_COLUMNS.contains(&key) {
                return key.to_owned();
            }
            let mut name = format!("{ATTR_COLUMN_PREFIX}{key}");
            while taken.contains(&name) {
                name.insert_str(0, ATTR_COLUMN_PREFIX);
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

fn write_jsonl(records: &[&EventRecord], precision: usize) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    for record in records {
        let feature = rounded(record.to_feature(), precision);
        serde_json::to_writer(&mut out, &feature).map_err(|e| ExportError::Write(e.to_string()))?;
        out.push(b'\n');
    }
    Ok(out)
}

fn write_err(e: csv::Error) -> ExportError {
    ExportError::Write(e.to_string())
}

/// Fixed-point text. A value that rounds to zero prints unsigned.
fn fixed(n: f64, precision: usize) -> String {
    let text = format!("{n:.precision$}");
    match text.strip_prefix('-') {
        Some(digits) if digits.bytes().all(|b| b == b'0' || b == b'.') => digits.to_owned(),
        _ => text,
    }
}

fn value_cell(value: &Value, precision: usize) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Num(n) => fixed(*n, precision),
        Value::Bool(b) => b.to_string(),
    }
}

/// Round to `precision` fractional digits via decimal formatting, so the
/// JSON number matches the CSV text for the same value.
fn round(n: f64, precision: usize) -> f64 {
    if !n.is_finite() {
        return n;
    }
    fixed(n, precision).parse().unwrap_or(n)
}

fn rounded(mut feature: FeatureDto, precision: usize) -> FeatureDto {
    for pair in &mut feature.geometry.coordinates {
        pair[0] = round(pair[0], precision);
        pair[1] = round(pair[1], precision);
    }
    for value in feature.attributes.values_mut() {
        if let Value::Num(n) = value {
            *n = round(*n, precision);
        }
    }
    feature
}
