// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used)]
//! End-to-end load → filter → export scenarios through [`Session`].

mod common;

use common::{init_tracing, point, three_points};
use oxy_core::{
    encode, CoreError, DecodeError, EngineConfig, EventRecord, ExportFormat, FilterError,
    FilterSpec, Geometry, GeometryType, Session, Value,
};
use oxy_geom::Coord;
use oxy_wasm_abi::{AttributePredicate, Bounds, PredicateOp};

#[test]
fn time_window_then_csv_export() {
    init_tracing();
    let mut s = Session::new();
    let summary = s.load(&three_points()).unwrap();
    assert_eq!(summary.records, 3);

    let spec = FilterSpec {
        time_min: Some(150),
        time_max: Some(250),
        ..FilterSpec::default()
    };
    let ids = s.apply_filters(&spec).unwrap().into_ids();
    assert_eq!(ids, vec![1]);

    let csv = String::from_utf8(s.export(&ids, ExportFormat::Csv).unwrap()).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], "1,Point,200,5.000000 5.000000");
}

#[test]
fn inverted_time_window_is_invalid_range() {
    let mut s = Session::new();
    s.load(&three_points()).unwrap();
    let spec = FilterSpec {
        time_min: Some(300),
        time_max: Some(100),
        ..FilterSpec::default()
    };
    assert!(matches!(
        s.apply_filters(&spec),
        Err(CoreError::Filter(FilterError::InvalidRange(_)))
    ));
}

#[test]
fn records_missing_an_attribute_are_excluded() {
    let mut s = Session::new();
    s.load(
        &encode(&[
            point(0.0, 0.0, Some(1), &[("org", Value::Str("ACLED".into()))]),
            point(0.0, 0.0, Some(2), &[]),
            point(0.0, 0.0, Some(3), &[("org", Value::Str("UN".into()))]),
        ])
        .unwrap(),
    )
    .unwrap();
    let spec = FilterSpec {
        attributes: vec![AttributePredicate {
            name: "org".into(),
            op: PredicateOp::Eq {
                value: Value::Str("ACLED".into()),
            },
        }],
        ..FilterSpec::default()
    };
    assert_eq!(s.apply_filters(&spec).unwrap().ids(), &[0]);
}

#[test]
fn empty_and_header_only_loads_succeed() {
    let mut s = Session::new();
    assert_eq!(s.load(&[]).unwrap().records, 0);
    assert_eq!(s.load(&encode(&[]).unwrap()).unwrap().records, 0);
    assert!(s.apply_filters(&FilterSpec::default()).unwrap().is_empty());
}

#[test]
fn filters_are_idempotent() {
    let mut s = Session::new();
    s.load(&three_points()).unwrap();
    let spec = FilterSpec {
        bounds: Some(Bounds {
            min_x: 0.5,
            min_y: 0.5,
            max_x: 10.0,
            max_y: 10.0,
        }),
        ..FilterSpec::default()
    };
    let a = s.apply_filters(&spec).unwrap();
    let b = s.apply_filters(&spec).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.ids(), &[1, 2]);
}

#[test]
fn failed_load_keeps_previous_dataset() {
    let mut s = Session::new();
    s.load(&three_points()).unwrap();

    let mut truncated = three_points();
    truncated.truncate(truncated.len() - 3);
    assert!(matches!(
        s.load(&truncated),
        Err(CoreError::Decode(DecodeError::Truncated(_)))
    ));
    assert!(matches!(
        s.load(b"NOPE\x01\x00\x00\x00"),
        Err(CoreError::Decode(DecodeError::BadHeader(_)))
    ));
    assert_eq!(s.stats().records, 3);
    assert_eq!(s.apply_filters(&FilterSpec::default()).unwrap().len(), 3);
}

#[test]
fn structured_export_round_trips_records() {
    let records = vec![
        point(12.5, -7.25, Some(1_700_000_000), &[
            ("org", Value::Str("ACLED".into())),
            ("fatalities", Value::Num(4.0)),
            ("verified", Value::Bool(true)),
        ]),
        point(3.0, 4.0, None, &[]),
    ];
    let mut s = Session::new();
    s.load(&encode(&records).unwrap()).unwrap();
    let out = s.export_all(ExportFormat::Structured).unwrap();

    let features: Vec<oxy_wasm_abi::FeatureDto> = out
        .split(|b| *b == b'\n')
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_slice(l).unwrap())
        .collect();
    assert_eq!(features, s.features(&[0, 1]).unwrap());
}

#[test]
fn structured_export_round_trips_mixed_geometry_within_precision() {
    let shape = |kind, pts: &[(f64, f64)], attrs: &[(&str, Value)]| EventRecord {
        id: 0,
        geometry: Geometry::new(kind, pts.iter().map(|&(x, y)| Coord::new(x, y)).collect())
            .unwrap(),
        timestamp: Some(42),
        attributes: attrs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect(),
    };
    let third = 1.0 / 3.0;
    let records = vec![
        shape(
            GeometryType::LineString,
            &[(0.1 + 0.2, -third), (12.345_678_9, 98.765_432_1)],
            &[("sentiment", Value::Num(-2.0 / 3.0))],
        ),
        shape(
            GeometryType::Polygon,
            &[(0.0, 0.0), (third, 0.0), (third, 0.7), (0.0, 0.0)],
            &[("momentum", Value::Num(1e-7)), ("org", Value::Str("UN".into()))],
        ),
        point(-179.999_999_95, 89.123_456_789, None, &[]),
    ];
    let mut s = Session::new();
    s.load(&encode(&records).unwrap()).unwrap();
    let out = s.export_all(ExportFormat::Structured).unwrap();
    let features: Vec<oxy_wasm_abi::FeatureDto> = out
        .split(|b| *b == b'\n')
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_slice(l).unwrap())
        .collect();
    assert_eq!(features.len(), records.len());

    for (feature, record) in features.iter().zip(&records) {
        assert_eq!(feature.geometry.kind, record.geometry.kind());
        assert_eq!(feature.timestamp, record.timestamp);
        assert_eq!(feature.geometry.coordinates.len(), record.geometry.coords().len());
        for (got, want) in feature.geometry.coordinates.iter().zip(record.geometry.coords()) {
            assert!((got[0] - want.x).abs() < 1e-6, "{got:?} vs {want:?}");
            assert!((got[1] - want.y).abs() < 1e-6, "{got:?} vs {want:?}");
        }
        assert_eq!(
            feature.attributes.keys().collect::<Vec<_>>(),
            record.attributes.keys().collect::<Vec<_>>()
        );
        for (key, want) in &record.attributes {
            match (&feature.attributes[key], want) {
                (Value::Num(got), Value::Num(want)) => assert!((got - want).abs() < 1e-6),
                (got, want) => assert_eq!(got, want),
            }
        }
    }
    // Rounded, not passed through.
    assert_eq!(features[0].geometry.coordinates[0], [0.3, -0.333_333]);
    assert_eq!(features[1].attributes["momentum"], Value::Num(0.0));
    assert_eq!(features[2].geometry.coordinates[0], [-180.0, 89.123_457]);
}

#[test]
fn strict_attributes_from_config() {
    let mut s = Session::with_config(EngineConfig {
        strict_attributes: true,
        ..EngineConfig::default()
    })
    .unwrap();
    s.load(&three_points()).unwrap();
    let spec = FilterSpec {
        attributes: vec![AttributePredicate {
            name: "org".into(),
            op: PredicateOp::In { values: vec![] },
        }],
        ..FilterSpec::default()
    };
    assert_eq!(
        s.apply_filters(&spec),
        Err(CoreError::Filter(FilterError::UnknownAttribute("org".into())))
    );
}

#[test]
fn record_limit_from_config() {
    let mut s = Session::with_config(EngineConfig {
        max_records: 2,
        ..EngineConfig::default()
    })
    .unwrap();
    assert!(matches!(
        s.load(&three_points()),
        Err(CoreError::Decode(DecodeError::MalformedRecord(_)))
    ));
    assert!(s.dataset().is_none());
}

#[test]
fn organisation_date_and_sentiment_query() {
    let event = |org: &str, day: i64, sentiment: f64| {
        point(
            30.0 + sentiment,
            10.0,
            Some(day * 86_400),
            &[
                ("org", Value::Str(org.into())),
                ("sentiment", Value::Num(sentiment)),
                ("momentum", Value::Num(sentiment * 2.0)),
            ],
        )
    };
    let mut s = Session::new();
    s.load(
        &encode(&[
            event("ACLED", 1, -0.8),
            event("ACLED", 5, 0.4),
            event("GDELT", 5, 0.4),
            event("ACLED", 9, 0.1),
            event("ACLED", 6, 0.9),
        ])
        .unwrap(),
    )
    .unwrap();

    let spec = FilterSpec {
        time_min: Some(2 * 86_400),
        time_max: Some(8 * 86_400),
        attributes: vec![
            AttributePredicate {
                name: "org".into(),
                op: PredicateOp::Eq {
                    value: Value::Str("ACLED".into()),
                },
            },
            AttributePredicate {
                name: "sentiment".into(),
                op: PredicateOp::Range {
                    min: Some(0.0),
                    max: Some(0.5),
                },
            },
        ],
        ..FilterSpec::default()
    };
    assert_eq!(s.apply_filters(&spec).unwrap().ids(), &[1]);
}
