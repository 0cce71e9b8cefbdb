// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record model: geometries, event records, and the loaded dataset.

use std::collections::{BTreeMap, BTreeSet};

use oxy_geom::{Aabb, Bvh, Coord, Shape};
use oxy_wasm_abi::{FeatureDto, GeometryDto, GeometryType, RecordId, Value};

use crate::error::DecodeError;

/// Smallest closed ring: a triangle plus the repeated first coordinate.
pub const MIN_RING_LEN: usize = 4;

/// A validated geometry: a type plus at least one coordinate pair.
///
/// Invariants (checked by [`Geometry::new`]):
/// - at least one coordinate, all finite;
/// - a point has exactly one coordinate;
/// - a polygon ring has at least [`MIN_RING_LEN`] coordinates and is closed
///   (first == last).
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    kind: GeometryType,
    coords: Vec<Coord>,
    bbox: Aabb,
}

impl Geometry {
    /// Validate and construct a geometry.
    pub fn new(kind: GeometryType, coords: Vec<Coord>) -> Result<Self, DecodeError> {
        let Some(bbox) = Aabb::from_points(&coords) else {
            return Err(DecodeError::MalformedGeometry(
                "coordinate count is zero".into(),
            ));
        };
        if let Some(bad) = coords.iter().position(|c| !c.is_finite()) {
            return Err(DecodeError::MalformedGeometry(format!(
                "coordinate {bad} is not finite"
            )));
        }
        match kind {
            GeometryType::Point if coords.len() != 1 => {
                return Err(DecodeError::MalformedGeometry(format!(
                    "point has {} coordinates",
                    coords.len()
                )));
            }
            GeometryType::Polygon if coords.len() < MIN_RING_LEN => {
                return Err(DecodeError::MalformedGeometry(format!(
                    "polygon ring has {} coordinates",
                    coords.len()
                )));
            }
            GeometryType::Polygon if coords.first() != coords.last() => {
                return Err(DecodeError::MalformedGeometry(
                    "polygon ring is not closed".into(),
                ));
            }
            _ => {}
        }
        Ok(Self { kind, coords, bbox })
    }

    /// Convenience constructor for a point.
    pub fn point(x: f64, y: f64) -> Result<Self, DecodeError> {
        Self::new(GeometryType::Point, vec![Coord::new(x, y)])
    }

    /// Geometry type.
    #[must_use]
    pub const fn kind(&self) -> GeometryType {
        self.kind
    }

    /// Ordered coordinates.
    #[must_use]
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// Bounding box over all coordinates.
    #[must_use]
    pub const fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    /// Exact intersection test against a query box.
    #[must_use]
    pub fn intersects(&self, query: &Aabb) -> bool {
        self.bbox.overlaps(query) && oxy_geom::intersects_box(self.shape(), &self.coords, query)
    }

    const fn shape(&self) -> Shape {
        match self.kind {
            GeometryType::Point => Shape::Point,
            GeometryType::LineString => Shape::LineString,
            GeometryType::Polygon => Shape::Polygon,
        }
    }
}

/// One decoded feature.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    /// Position in the dataset (0-based decode order).
    pub id: RecordId,
    /// Geometry.
    pub geometry: Geometry,
    /// Timestamp; `None` when the feature carries none.
    pub timestamp: Option<i64>,
    /// Attributes by name.
    pub attributes: BTreeMap<String, Value>,
}

impl EventRecord {
    /// Looks up one attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Host-facing representation with full precision.
    #[must_use]
    pub fn to_feature(&self) -> FeatureDto {
        FeatureDto {
            id: self.id,
            geometry: GeometryDto {
                kind: self.geometry.kind(),
                coordinates: self.geometry.coords().iter().map(|c| c.to_array()).collect(),
            },
            timestamp: self.timestamp,
            attributes: self.attributes.clone(),
        }
    }

    fn heap_bytes(&self) -> usize {
        let coords = self.geometry.coords.capacity() * core::mem::size_of::<Coord>();
        let attrs: usize = self
            .attributes
            .iter()
            .map(|(k, v)| {
                k.capacity()
                    + core::mem::size_of::<Value>()
                    + match v {
                        Value::Str(s) => s.capacity(),
                        Value::Num(_) | Value::Bool(_) => 0,
                    }
            })
            .sum();
        coords + attrs
    }
}

/// The loaded collection: records, their attribute schema, and the spatial index.
///
/// Records are immutable once the dataset is published by the session; a
/// reload replaces the whole dataset.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<EventRecord>,
    schema: BTreeSet<String>,
    index: Option<Bvh>,
}

impl Dataset {
    /// Wraps `records`, renumbering ids to match their positions.
    ///
    /// The index starts empty; call [`Dataset::build_index`] before publishing.
    #[must_use]
    pub fn new(mut records: Vec<EventRecord>) -> Self {
        let mut schema = BTreeSet::new();
        for (pos, record) in records.iter_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            {
                record.id = pos as RecordId;
            }
            for key in record.attributes.keys() {
                if !schema.contains(key) {
                    schema.insert(key.clone());
                }
            }
        }
        Self {
            records,
            schema,
            index: None,
        }
    }

    /// Builds the bounding-volume hierarchy over record boxes.
    pub fn build_index(&mut self, leaf_size: usize) {
        let boxes: Vec<Aabb> = self.records.iter().map(|r| *r.geometry.bbox()).collect();
        self.index = Some(Bvh::build(&boxes, leaf_size));
    }

    /// Consuming variant of [`Dataset::build_index`].
    #[must_use]
    pub fn with_index(mut self, leaf_size: usize) -> Self {
        self.build_index(leaf_size);
        self
    }

    /// Records in id order.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Record by id.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&EventRecord> {
        self.records.get(id as usize)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the dataset holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Attribute names observed in any record, sorted.
    #[must_use]
    pub const fn schema(&self) -> &BTreeSet<String> {
        &self.schema
    }

    /// Spatial index, once built.
    #[must_use]
    pub const fn index(&self) -> Option<&Bvh> {
        self.index.as_ref()
    }

    /// Approximate heap footprint in bytes.
    #[must_use]
    pub fn heap_bytes(&self) -> usize {
        self.records.capacity() * core::mem::size_of::<EventRecord>()
            + self.records.iter().map(EventRecord::heap_bytes).sum::<usize>()
            + self.index.as_ref().map_or(0, Bvh::heap_bytes)
    }
}
