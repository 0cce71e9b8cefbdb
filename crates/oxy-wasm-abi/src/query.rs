// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filter query DTOs.
//!
//! A [`FilterSpec`] is transient: the host builds one per query from its UI
//! state, and the core validates it before evaluating anything. Field names
//! are camelCase on the wire (`timeMin`, `minX`, ...).

use crate::Value;
use serde::{Deserialize, Serialize};

/// Inclusive query rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// Minimum x.
    pub min_x: f64,
    /// Minimum y.
    pub min_y: f64,
    /// Maximum x.
    pub max_x: f64,
    /// Maximum y.
    pub max_y: f64,
}

/// Constraint applied to one attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PredicateOp {
    /// Attribute equals `value` (same type and payload).
    Eq {
        /// Expected value.
        value: Value,
    },
    /// Numeric attribute within an inclusive range; either bound may be open.
    Range {
        /// Lower bound.
        #[serde(default)]
        min: Option<f64>,
        /// Upper bound.
        #[serde(default)]
        max: Option<f64>,
    },
    /// Attribute equals any of `values`.
    In {
        /// Accepted values.
        values: Vec<Value>,
    },
}

/// One attribute predicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributePredicate {
    /// Attribute name.
    pub name: String,
    /// Constraint.
    pub op: PredicateOp,
}

/// Result ordering by record id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultOrder {
    /// Ascending id (the default).
    #[default]
    Ascending,
    /// Descending id.
    Descending,
}

/// A complete filter query. Every present predicate must hold (logical AND).
///
/// The empty spec matches every record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Spatial predicate.
    pub bounds: Option<Bounds>,
    /// Inclusive lower time bound.
    pub time_min: Option<i64>,
    /// Inclusive upper time bound.
    pub time_max: Option<i64>,
    /// Attribute predicates.
    pub attributes: Vec<AttributePredicate>,
    /// Reject attribute names that never occur in the dataset.
    pub strict: bool,
    /// Result ordering.
    pub order: ResultOrder,
}

impl FilterSpec {
    /// Returns `true` when the spec carries a time bound.
    #[must_use]
    pub const fn has_time_window(&self) -> bool {
        self.time_min.is_some() || self.time_max.is_some()
    }
}

/// How much the host wants back from a filter request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Detail {
    /// Record ids only.
    #[default]
    Ids,
    /// Record ids plus materialized features.
    Features,
}
