// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filter evaluation.
//!
//! A query runs in two phases. [`validate`] checks every predicate against
//! its own range rules and the dataset schema; only then does evaluation start,
//! so a failing query never yields a partial result.
//!
//! Evaluation narrows candidates with the spatial index when the query has
//! bounds, confirms each candidate with the exact geometry test, and then
//! applies the time window and attribute predicates in that order.

use oxy_geom::{Aabb, Coord};
use oxy_wasm_abi::query::{AttributePredicate, Bounds, PredicateOp, ResultOrder};
use oxy_wasm_abi::{FilterSpec, RecordId, Value};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::FilterError;
use crate::model::{Dataset, EventRecord};

/// Ordered, duplicate-free record ids matching a filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    ids: Vec<RecordId>,
}

impl ResultSet {
    /// Matching ids in the requested order.
    #[must_use]
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Number of matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Consumes the set, yielding its ids.
    #[must_use]
    pub fn into_ids(self) -> Vec<RecordId> {
        self.ids
    }
}

/// Check `spec` without touching any record.
///
/// Range rules always apply. The strict schema check is skipped for an empty
/// dataset, which has no schema and matches nothing anyway.
pub fn validate(dataset: &Dataset, spec: &FilterSpec, strict: bool) -> Result<(), FilterError> {
    if let Some(b) = &spec.bounds {
        bounds_box(b)?;
    }
    if let (Some(min), Some(max)) = (spec.time_min, spec.time_max) {
        if min > max {
            return Err(FilterError::InvalidRange(format!("time {min} > {max}")));
        }
    }
    for pred in &spec.attributes {
        if let PredicateOp::Range { min, max } = &pred.op {
            if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
                return Err(FilterError::InvalidRange(format!(
                    "attribute {:?} has a NaN bound",
                    pred.name
                )));
            }
            if let (Some(lo), Some(hi)) = (min, max) {
                if lo > hi {
                    return Err(FilterError::InvalidRange(format!(
                        "attribute {:?} {lo} > {hi}",
                        pred.name
                    )));
                }
            }
        }
        if strict && !dataset.is_empty() && !dataset.schema().contains(&pred.name) {
            return Err(FilterError::UnknownAttribute(pred.name.clone()));
        }
    }
    Ok(())
}

/// Evaluate `spec` against `dataset`.
///
/// Strict attribute mode is on when either `spec.strict` or
/// `config.strict_attributes` is set.
pub fn evaluate(
    dataset: &Dataset,
    spec: &FilterSpec,
    config: &EngineConfig,
) -> Result<ResultSet, FilterError> {
    validate(dataset, spec, spec.strict || config.strict_attributes)?;

    let query = spec.bounds.as_ref().map(bounds_box).transpose()?;
    let keep = |r: &EventRecord| {
        query.as_ref().is_none_or(|q| r.geometry.intersects(q))
            && in_window(r.timestamp, spec)
            && spec.attributes.iter().all(|p| matches_attribute(r, p))
    };

    let mut ids: Vec<RecordId> = match (&query, dataset.index()) {
        (Some(q), Some(index)) => {
            let mut candidates = index.query(q);
            candidates.sort_unstable();
            candidates
                .into_iter()
                .filter_map(|id| dataset.get(id))
                .filter(|&r| keep(r))
                .map(|r| r.id)
                .collect()
        }
        _ => dataset
            .records()
            .iter()
            .filter(|&r| keep(r))
            .map(|r| r.id)
            .collect(),
    };
    if spec.order == ResultOrder::Descending {
        ids.reverse();
    }
    debug!(
        matched = ids.len(),
        records = dataset.len(),
        indexed = query.is_some() && dataset.index().is_some(),
        "filter evaluated"
    );
    Ok(ResultSet { ids })
}

fn bounds_box(b: &Bounds) -> Result<Aabb, FilterError> {
    Aabb::new(Coord::new(b.min_x, b.min_y), Coord::new(b.max_x, b.max_y)).ok_or_else(|| {
        FilterError::InvalidRange(format!(
            "bounds ({}, {}) .. ({}, {})",
            b.min_x, b.min_y, b.max_x, b.max_y
        ))
    })
}

fn in_window(timestamp: Option<i64>, spec: &FilterSpec) -> bool {
    if !spec.has_time_window() {
        return true;
    }
    timestamp.is_some_and(|t| {
        spec.time_min.is_none_or(|min| t >= min) && spec.time_max.is_none_or(|max| t <= max)
    })
}

fn matches_attribute(record: &EventRecord, pred: &AttributePredicate) -> bool {
    let Some(value) = record.attribute(&pred.name) else {
        return false;
    };
    match &pred.op {
        PredicateOp::Eq { value: expected } => value == expected,
        PredicateOp::Range { min, max } => value.as_num().is_some_and(|n| {
            min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi)
        }),
        PredicateOp::In { values } => values.iter().any(|v: &Value| v == value),
    }
}
