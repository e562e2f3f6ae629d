//! ESXi RAID Exporter
//!
//! Collects RAID controller, drive and SMART health from an ESXi host's
//! command-line tools and publishes it as Prometheus gauges.
//!
//! # Architecture
//!
//! ```text
//! CommandRunner (tools) → Extraction Core (parsers) → MeasurementSink (gauges)
//! ```
//!
//! The extraction core never runs a process or touches a registry; both sit
//! behind ports in [`domain::ports`] so every parser can be driven from
//! canned output in tests.
//!
//! # Modules
//!
//! - [`adapters`] - Shell runner, Prometheus sink and in-memory doubles
//! - [`collector`] - Source selection, collection cycle and rescan scheduler
//! - [`domain`] - Measurement model and ports
//! - [`error`] - Error types
//! - [`hardware`] - SMART decoders, device discovery and controller topology
//! - [`health`] - Liveness and readiness state

pub mod adapters;
pub mod collector;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod health;

// Re-export commonly used types
pub use adapters::{PrometheusSink, ShellCommandRunner};
pub use collector::{CollectionReport, CollectorConfig, DataSource, SourceOrchestrator};
pub use domain::{CommandRunner, MeasurementSink, Metric};
pub use error::{Error, Result};
pub use health::HealthCheck;
