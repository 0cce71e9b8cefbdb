// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Oxy compute core.
//!
//! Data flow: container bytes → [`decode`] → [`Dataset`] (records + BVH,
//! built once per load) → [`filter::evaluate`] (repeatable) →
//! [`export::write`] → bytes.
//!
//! [`Session`] is the single owner of the live dataset and the only surface a
//! host needs. Everything here runs to completion synchronously; nothing
//! blocks, spawns, or relies on timers, so the crate is safe to drive from a
//! single-threaded WASM guest.

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod export;
pub mod fgb;
pub mod filter;
pub mod model;
pub mod session;

pub use config::EngineConfig;
pub use decode::{decode, decode_with_limit};
pub use encode::encode;
pub use error::{ConfigError, CoreError, DecodeError, ExportError, FilterError};
pub use export::ExportFormat;
pub use filter::ResultSet;
pub use model::{Dataset, EventRecord, Geometry};
pub use session::{LoadSummary, Session};

pub use oxy_wasm_abi::{FilterSpec, GeometryType, RecordId, Value};
