#![forbid(unsafe_code)]
//! siren-core: ticket/alert lifecycle state machine and SLA compliance
//! engine.
//!
//! Raw items flow status-validated mutation -> per-item classification ->
//! collection-level aggregation -> threshold monitoring; the output of a
//! pass is an [`aggregate::AggregateReport`] ready for a dashboard or API
//! response.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums ([`error::EngineError`]) inside the
//!   engine; `anyhow::Result` at config/file boundaries.
//! - **Logging**: `tracing` macros (`warn!` for policy fallbacks and
//!   threshold breaches, `debug!` for per-item diagnostics).

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod policy;
pub mod store;

pub use aggregate::{AggregateOptions, AggregateReport, Aggregator, DefaultKeys, KeyStrategy};
pub use config::{BusinessHours, EngineConfig};
pub use error::{EngineError, ErrorCode};
pub use model::item::{Status, WorkItem};
pub use monitor::{ComplianceWarning, MonitorThresholds};
pub use policy::{PolicyCatalog, SlaPolicy};
pub use store::ItemStore;
