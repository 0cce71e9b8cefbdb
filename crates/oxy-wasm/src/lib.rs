// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! wasm-bindgen bindings for the Oxy compute core.
//!
//! Exposes a single stateful [`GeoProcessor`] to browser hosts. Every method
//! takes and returns CBOR bytes; responses are always an
//! [`Envelope`](oxy_wasm_abi::Envelope), so nothing here throws into JS.
//!
//! The `*_bytes` methods carry the logic and are plain Rust, so native tests
//! drive them directly; the `#[wasm_bindgen]` methods only copy the result
//! into a `Uint8Array`.
#![deny(missing_docs)]

use js_sys::Uint8Array;
use oxy_core::{CoreError, EngineConfig, ExportFormat, Session};
use oxy_wasm_abi::envelope::{
    ExportRequest, ExportResponse, FilterRequest, FilterResponse, LoadResponse,
};
use oxy_wasm_abi::{
    decode_cbor, encode_cbor, AbiError, Detail, Envelope, ErrorCode, ABI_VERSION,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;

#[cfg(feature = "console-panic")]
#[wasm_bindgen(start)]
/// Initialize console panic hook for better error messages in browser.
pub fn init_console_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Browser-facing processor owning one [`Session`].
#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct GeoProcessor {
    session: Session,
}

#[wasm_bindgen]
impl GeoProcessor {
    /// Processor with default configuration and no dataset.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            session: Session::new(),
        }
    }

    /// Replace the engine configuration from a CBOR `EngineConfig` map.
    ///
    /// Returns `Envelope<EngineConfig>`. Any loaded dataset is dropped, since
    /// its index was built under the old settings.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(&mut self, config: &[u8]) -> Uint8Array {
        to_array(&self.with_config_bytes(config))
    }

    /// Decode and index a feature container. Returns `Envelope<LoadResponse>`.
    #[wasm_bindgen(js_name = loadData)]
    pub fn load_data(&mut self, bytes: &[u8]) -> Uint8Array {
        to_array(&self.load_data_bytes(bytes))
    }

    /// Run a CBOR `FilterRequest`. Returns `Envelope<FilterResponse>`.
    #[wasm_bindgen(js_name = applyFilters)]
    pub fn apply_filters(&self, request: &[u8]) -> Uint8Array {
        to_array(&self.apply_filters_bytes(request))
    }

    /// Run a CBOR `ExportRequest`. Returns `Envelope<ExportResponse>`.
    #[wasm_bindgen(js_name = exportData)]
    pub fn export_data(&self, request: &[u8]) -> Uint8Array {
        to_array(&self.export_data_bytes(request))
    }

    /// Returns `Envelope<StatsResponse>`.
    pub fn stats(&self) -> Uint8Array {
        to_array(&self.stats_bytes())
    }
}

impl GeoProcessor {
    /// Byte-level [`GeoProcessor::with_config`].
    pub fn with_config_bytes(&mut self, config: &[u8]) -> Vec<u8> {
        respond(
            EngineConfig::from_cbor(config)
                .map_err(CoreError::from)
                .and_then(|cfg| {
                    self.session = Session::with_config(cfg.clone())?;
                    Ok(cfg)
                }),
        )
    }

    /// Byte-level [`GeoProcessor::load_data`].
    pub fn load_data_bytes(&mut self, bytes: &[u8]) -> Vec<u8> {
        respond(self.session.load(bytes).map(|summary| LoadResponse {
            records: u32::try_from(summary.records).unwrap_or(u32::MAX),
            schema: summary.schema,
        }))
    }

    /// Byte-level [`GeoProcessor::apply_filters`].
    pub fn apply_filters_bytes(&self, request: &[u8]) -> Vec<u8> {
        respond(
            decode_request::<FilterRequest>(request, |r| r.abi_version).and_then(|req| {
                let ids = self.session.apply_filters(&req.spec)?.into_ids();
                let features = match req.detail {
                    Detail::Ids => None,
                    Detail::Features => Some(self.session.features(&ids)?),
                };
                Ok(FilterResponse { ids, features })
            }),
        )
    }

    /// Byte-level [`GeoProcessor::export_data`].
    pub fn export_data_bytes(&self, request: &[u8]) -> Vec<u8> {
        respond(
            decode_request::<ExportRequest>(request, |r| r.abi_version).and_then(|req| {
                let format: ExportFormat = req.format.parse()?;
                let bytes = self.session.export(&req.ids, format)?;
                Ok(ExportResponse {
                    format: format.name().to_owned(),
                    mime: format.mime().to_owned(),
                    bytes,
                })
            }),
        )
    }

    /// Byte-level [`GeoProcessor::stats`].
    pub fn stats_bytes(&self) -> Vec<u8> {
        respond(Ok(self.session.stats()))
    }

    /// The wrapped session.
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

fn to_array(bytes: &[u8]) -> Uint8Array {
    Uint8Array::from(bytes)
}

fn decode_request<T: DeserializeOwned>(
    bytes: &[u8],
    version: impl Fn(&T) -> u16,
) -> Result<T, CoreError> {
    let request: T = decode_cbor(bytes).map_err(|e| CoreError::Request(e.to_string()))?;
    let got = version(&request);
    if got != ABI_VERSION {
        return Err(CoreError::Request(format!(
            "abi version {got} not supported (expected {ABI_VERSION})"
        )));
    }
    Ok(request)
}

/// Encode a result as a CBOR envelope. Falls back to an `Internal` error
/// envelope if the payload itself cannot be encoded.
fn respond<T: Serialize>(result: Result<T, CoreError>) -> Vec<u8> {
    if let Err(e) = &result {
        warn!(code = ?e.code(), error = %e, "request failed");
        #[cfg(feature = "console-panic")]
        web_sys::console::error_1(&e.to_string().into());
    }
    let envelope: Envelope<T> = result.into();
    encode_cbor(&envelope).unwrap_or_else(|e| {
        warn!(error = %e, "response encoding failed");
        encode_cbor(&Envelope::<()>::err(AbiError::new(
            ErrorCode::Internal,
            e.to_string(),
        )))
        .unwrap_or_default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use oxy_wasm_abi::envelope::StatsResponse;

    #[test]
    fn garbage_request_is_bad_request() {
        let p = GeoProcessor::new();
        let env: Envelope<FilterResponse> = decode_cbor(&p.apply_filters_bytes(b"\xff\x00")).unwrap();
        assert_eq!(env.into_result().unwrap_err().code, ErrorCode::BadRequest);
    }

    #[test]
    fn fresh_processor_reports_nothing_loaded() {
        let p = GeoProcessor::new();
        let env: Envelope<StatsResponse> = decode_cbor(&p.stats_bytes()).unwrap();
        assert_eq!(env.into_result().unwrap(), StatsResponse::default());
    }
}
