// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for the Oxy benchmarks.
//!
//! Datasets are generated from a fixed seed so runs are comparable.

use std::collections::BTreeMap;

use oxy_core::{DecodeError, EventRecord, Geometry, Value};
use oxy_geom::Coord;
use oxy_wasm_abi::GeometryType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used by every fixture.
pub const SEED: u64 = 0x0005_EED0_0A11;

const ORGS: [&str; 4] = ["ACLED", "GDELT", "UCDP", "UN"];

/// `n` records scattered over a 360 x 180 world: mostly points, every
/// tenth a short line, every twenty-fifth a small square polygon.
pub fn synthetic_records(n: usize) -> Result<Vec<EventRecord>, DecodeError> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..n)
        .map(|i| {
            let x = rng.gen_range(-180.0..180.0);
            let y = rng.gen_range(-90.0..90.0);
            let geometry = if i % 25 == 0 {
                Geometry::new(
                    GeometryType::Polygon,
                    vec![
                        Coord::new(x, y),
                        Coord::new(x + 0.5, y),
                        Coord::new(x + 0.5, y + 0.5),
                        Coord::new(x, y + 0.5),
                        Coord::new(x, y),
                    ],
                )
            } else if i % 10 == 0 {
                Geometry::new(
                    GeometryType::LineString,
                    vec![Coord::new(x, y), Coord::new(x + 1.0, y - 1.0)],
                )
            } else {
                Geometry::point(x, y)
            };
            let mut attributes = BTreeMap::new();
            attributes.insert(
                "org".to_owned(),
                Value::Str(ORGS[i % ORGS.len()].to_owned()),
            );
            attributes.insert("sentiment".to_owned(), Value::Num(rng.gen_range(-1.0..1.0)));
            Ok(EventRecord {
                id: 0,
                geometry: geometry?,
                timestamp: Some(rng.gen_range(0..1_000_000)),
                attributes,
            })
        })
        .collect()
}

/// [`synthetic_records`] encoded as a container.
pub fn synthetic_container(n: usize) -> Result<Vec<u8>, DecodeError> {
    oxy_core::encode(&synthetic_records(n)?)
}
