// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session: the single owner of the live dataset.
//!
//! Hosts talk to a [`Session`] and nothing else. A load either replaces the
//! dataset completely or leaves the previous one in place; filters and
//! exports only read.

use oxy_wasm_abi::envelope::StatsResponse;
use oxy_wasm_abi::{FeatureDto, FilterSpec, RecordId};
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::decode::decode_with_limit;
use crate::error::{CoreError, ExportError};
use crate::export::{self, ExportFormat};
use crate::filter::{self, ResultSet};
use crate::model::Dataset;

/// Outcome of a successful load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    /// Records in the new dataset.
    pub records: usize,
    /// Sorted attribute names observed across the dataset.
    pub schema: Vec<String>,
}

/// Owns the engine config and at most one loaded dataset.
#[derive(Debug, Default)]
pub struct Session {
    config: EngineConfig,
    dataset: Option<Dataset>,
}

impl Session {
    /// Session with default configuration and nothing loaded.
    #[instrument]
    pub fn new() -> Self {
        info!("session created");
        Self::default()
    }

    /// Session with a validated configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        info!(?config, "session created");
        Ok(Self {
            config,
            dataset: None,
        })
    }

    /// Active configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loaded dataset, if any.
    pub const fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Decode `bytes`, index the records, and make them the active dataset.
    ///
    /// On error the previously loaded dataset stays active.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn load(&mut self, bytes: &[u8]) -> Result<LoadSummary, CoreError> {
        let dataset = match decode_with_limit(bytes, self.config.max_records) {
            Ok(ds) => ds.with_index(self.config.leaf_size),
            Err(e) => {
                warn!(error = %e, "load rejected; keeping previous dataset");
                return Err(e.into());
            }
        };
        let summary = LoadSummary {
            records: dataset.len(),
            schema: dataset.schema().iter().cloned().collect(),
        };
        info!(
            records = summary.records,
            attributes = summary.schema.len(),
            index_nodes = dataset.index().map_or(0, |i| i.nodes().len()),
            "dataset loaded"
        );
        self.dataset = Some(dataset);
        Ok(summary)
    }

    /// Drop the active dataset.
    pub fn unload(&mut self) {
        if self.dataset.take().is_some() {
            info!("dataset unloaded");
        }
    }

    /// Evaluate a filter against the active dataset.
    ///
    /// With nothing loaded every valid spec yields an empty result.
    #[instrument(skip(self, spec))]
    pub fn apply_filters(&self, spec: &FilterSpec) -> Result<ResultSet, CoreError> {
        let empty = Dataset::default();
        let dataset = self.dataset.as_ref().unwrap_or(&empty);
        let result = filter::evaluate(dataset, spec, &self.config)?;
        info!(matched = result.len(), "filter applied");
        Ok(result)
    }

    /// Serialize the named records.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub fn export(&self, ids: &[RecordId], format: ExportFormat) -> Result<Vec<u8>, CoreError> {
        let empty = Dataset::default();
        let dataset = self.dataset.as_ref().unwrap_or(&empty);
        Ok(export::write(dataset, ids, format, self.config.precision)?)
    }

    /// [`Session::export`] with a host format tag.
    pub fn export_tagged(&self, ids: &[RecordId], tag: &str) -> Result<Vec<u8>, CoreError> {
        let format: ExportFormat = tag.parse()?;
        self.export(ids, format)
    }

    /// Serialize every record in id order.
    pub fn export_all(&self, format: ExportFormat) -> Result<Vec<u8>, CoreError> {
        let ids: Vec<RecordId> = self
            .dataset
            .as_ref()
            .map(|ds| ds.records().iter().map(|r| r.id).collect())
            .unwrap_or_default();
        self.export(&ids, format)
    }

    /// Host-facing features for `ids`, in the given order.
    pub fn features(&self, ids: &[RecordId]) -> Result<Vec<FeatureDto>, CoreError> {
        ids.iter()
            .map(|&id| {
                self.dataset
                    .as_ref()
                    .and_then(|ds| ds.get(id))
                    .map(crate::model::EventRecord::to_feature)
                    .ok_or(CoreError::Export(ExportError::UnknownId(id)))
            })
            .collect()
    }

    /// Counts and approximate memory footprint of the active dataset.
    pub fn stats(&self) -> StatsResponse {
        let Some(ds) = &self.dataset else {
            return StatsResponse {
                loaded: false,
                records: 0,
                index_nodes: 0,
                index_depth: 0,
                memory_bytes: 0,
            };
        };
        let saturate = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        StatsResponse {
            loaded: true,
            records: saturate(ds.len()),
            index_nodes: saturate(ds.index().map_or(0, |i| i.nodes().len())),
            index_depth: saturate(ds.index().map_or(0, oxy_geom::Bvh::depth)),
            memory_bytes: u64::try_from(ds.heap_bytes()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn nothing_loaded_behaves_as_empty_dataset() {
        let s = Session::new();
        assert!(s.apply_filters(&FilterSpec::default()).unwrap().is_empty());
        assert!(!s.stats().loaded);
        let csv = s.export_all(ExportFormat::Csv).unwrap();
        assert_eq!(csv, b"id,geometry_type,timestamp,geometry\n");
        assert!(matches!(
            s.export(&[0], ExportFormat::Csv),
            Err(CoreError::Export(ExportError::UnknownId(0)))
        ));
    }

    #[test]
    fn strict_filters_on_nothing_loaded_are_empty_not_errors() {
        let s = Session::with_config(EngineConfig {
            strict_attributes: true,
            ..EngineConfig::default()
        })
        .unwrap();
        let spec = FilterSpec {
            attributes: vec![oxy_wasm_abi::query::AttributePredicate {
                name: "org".into(),
                op: oxy_wasm_abi::query::PredicateOp::Eq {
                    value: oxy_wasm_abi::Value::Str("UN".into()),
                },
            }],
            ..FilterSpec::default()
        };
        assert!(s.apply_filters(&spec).unwrap().is_empty());
        let inverted = FilterSpec {
            time_min: Some(2),
            time_max: Some(1),
            ..spec
        };
        assert!(matches!(
            s.apply_filters(&inverted),
            Err(CoreError::Filter(crate::FilterError::InvalidRange(_)))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = EngineConfig {
            leaf_size: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(Session::with_config(cfg), Err(CoreError::Config(_))));
    }

    #[test]
    fn unload_clears_dataset() {
        let mut s = Session::new();
        s.load(&crate::encode(&[]).unwrap()).unwrap();
        assert!(s.dataset().is_some());
        s.unload();
        assert!(s.dataset().is_none());
    }
}
