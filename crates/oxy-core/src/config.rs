// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine configuration.
//!
//! The host hands the engine a JSON or CBOR blob once at construction; an
//! empty blob means defaults. Unknown keys are rejected so typos surface.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default maximum records per BVH leaf.
pub const DEFAULT_LEAF_SIZE: usize = oxy_geom::broad::bvh::DEFAULT_LEAF_SIZE;
/// Default fractional digits for exported numbers.
pub const DEFAULT_PRECISION: usize = 6;
/// Default cap on records accepted by one load.
pub const DEFAULT_MAX_RECORDS: usize = 10_000_000;

/// Tunables for index build, filtering, and export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum records per BVH leaf (`1..=64`).
    pub leaf_size: usize,
    /// Fractional digits for coordinates and numeric attributes in exports (`0..=15`).
    pub precision: usize,
    /// Reject filters naming attributes that never occur in the dataset.
    pub strict_attributes: bool,
    /// Largest record count a single load may produce.
    pub max_records: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            leaf_size: DEFAULT_LEAF_SIZE,
            precision: DEFAULT_PRECISION,
            strict_attributes: false,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl EngineConfig {
    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=64).contains(&self.leaf_size) {
            return Err(ConfigError::InvalidLeafSize(self.leaf_size));
        }
        if self.precision > 15 {
            return Err(ConfigError::InvalidPrecision(self.precision));
        }
        if self.max_records == 0 || u32::try_from(self.max_records).is_err() {
            return Err(ConfigError::InvalidMaxRecords(self.max_records));
        }
        Ok(())
    }

    /// Parse and validate a JSON config blob. Empty input yields defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a CBOR config blob. Empty input yields defaults.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            ciborium::from_reader(bytes).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
        assert_eq!(EngineConfig::from_json(b"").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = EngineConfig::from_json(br#"{"strictAttributes": true, "leafSize": 16}"#).unwrap();
        assert!(cfg.strict_attributes);
        assert_eq!(cfg.leaf_size, 16);
        assert_eq!(cfg.precision, DEFAULT_PRECISION);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            EngineConfig::from_json(br#"{"leafSize": 0}"#),
            Err(ConfigError::InvalidLeafSize(0))
        );
        assert_eq!(
            EngineConfig::from_json(br#"{"precision": 20}"#),
            Err(ConfigError::InvalidPrecision(20))
        );
        assert!(matches!(
            EngineConfig::from_json(br#"{"leafsize": 4}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn cbor_blob_parses() {
        let mut buf = Vec::new();
        ciborium::into_writer(
            &EngineConfig {
                precision: 3,
                ..EngineConfig::default()
            },
            &mut buf,
        )
        .unwrap();
        assert_eq!(EngineConfig::from_cbor(&buf).unwrap().precision, 3);
    }
}
