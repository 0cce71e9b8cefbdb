// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::unwrap_used)]
//! Shared fixtures for oxy-core integration tests.

use std::collections::BTreeMap;

use oxy_core::{encode, EventRecord, Geometry, Value};

/// Install a test subscriber once; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Point record with the given timestamp and attributes.
pub fn point(x: f64, y: f64, ts: Option<i64>, attrs: &[(&str, Value)]) -> EventRecord {
    EventRecord {
        id: 0,
        geometry: Geometry::point(x, y).unwrap(),
        timestamp: ts,
        attributes: attrs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Three points at (0,0), (5,5), (10,10) with timestamps 100, 200, 300.
pub fn three_points() -> Vec<u8> {
    encode(&[
        point(0.0, 0.0, Some(100), &[]),
        point(5.0, 5.0, Some(200), &[]),
        point(10.0, 10.0, Some(300), &[]),
    ])
    .unwrap()
}
