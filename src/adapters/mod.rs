//! Infrastructure Adapters
//!
//! This module contains adapter implementations for the domain ports,
//! following the Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │          CommandRunner      │      MeasurementSink          │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │ ShellCommandRunner │ PrometheusSink                         │ │
//! │  │ StaticCommandRunner │ InMemorySink                          │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use esxi_raid_exporter::adapters::{PrometheusSink, ShellCommandRunner};
//! use esxi_raid_exporter::domain::{CommandRunner, MeasurementSink, Metric};
//!
//! # async fn example() -> esxi_raid_exporter::Result<()> {
//! let runner = ShellCommandRunner::default();
//! let listing = runner.run("esxcli storage core device list").await?;
//!
//! let sink = PrometheusSink::new()?;
//! sink.set(Metric::SmartctlInfo, &["esx01"], 1.0)?;
//! # Ok(())
//! # }
//! ```

mod memory;
mod prometheus;
mod shell;

pub use memory::{InMemorySink, StaticCommandRunner};
pub use prometheus::PrometheusSink;
pub use shell::{ShellCommandRunner, ShellConfig, DEFAULT_COMMAND_TIMEOUT};
