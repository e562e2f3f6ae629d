//! Domain Layer
//!
//! Ports the extraction core depends on, and the catalog of measurements it
//! publishes.
//!
//! - **Ports** (`ports.rs`) - `CommandRunner` and `MeasurementSink`
//! - **Measurements** (`measurement.rs`) - gauge names and label schemas
//!
//! # Usage
//!
//! ```ignore
//! use esxi_raid_exporter::domain::{CommandRunner, MeasurementSink, Metric};
//!
//! async fn publish_controller<R, S>(runner: &R, sink: &S) -> Result<()>
//! where
//!     R: CommandRunner,
//!     S: MeasurementSink,
//! {
//!     let output = runner.run("./perccli /cALL show all J").await?;
//!     sink.set(Metric::ControllerStatus, &["0"], 1.0)?;
//!     Ok(())
//! }
//! ```

pub mod measurement;
pub mod ports;

pub use measurement::{flag, Metric, FALLBACK_CONTROLLER, NAMESPACE, UNKNOWN};
pub use ports::{CommandRunner, MeasurementSink};
