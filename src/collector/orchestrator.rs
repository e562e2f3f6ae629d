//! Source Orchestrator
//!
//! One collection cycle: reset the sink, try the structured controller dump,
//! and fall back to device discovery when the dump is unusable.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::CollectorConfig;
use crate::domain::{flag, CommandRunner, MeasurementSink, Metric, FALLBACK_CONTROLLER};
use crate::error::Result;
use crate::hardware::discovery::scan_device_list;
use crate::hardware::smart::{decode_smart_hex, extract_smart_hex, parse_smart_table, SmartAttributes};
use crate::hardware::topology::{extract_topology, ControllerTopology};

/// Marker the controller tool reports when the host has no supported controller.
const NO_CONTROLLER_FOUND: &str = "No Controller found";

// =============================================================================
// Source Selection
// =============================================================================

/// Where a cycle's measurements came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Structured controller dump
    Controller,
    /// Host device listing and smartctl
    Fallback,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Controller => write!(f, "controller"),
            DataSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Why a decoded controller dump cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUnusable {
    /// `Controllers` is missing or empty
    NoControllers,
    /// The first controller reports that no controller was found
    NoControllerFound(String),
}

impl std::fmt::Display for SourceUnusable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceUnusable::NoControllers => write!(f, "response lists no controllers"),
            SourceUnusable::NoControllerFound(description) => {
                write!(f, "controller tool reported: {}", description)
            }
        }
    }
}

/// Decode the controller tool's JSON output.
pub fn decode_controller_dump(output: &str) -> Result<Value> {
    Ok(serde_json::from_str(output)?)
}

/// Decide whether a decoded controller dump can be used.
pub fn check_structured_response(root: &Value) -> std::result::Result<(), SourceUnusable> {
    let first = root
        .get("Controllers")
        .and_then(Value::as_array)
        .and_then(|controllers| controllers.first())
        .ok_or(SourceUnusable::NoControllers)?;

    let Some(status) = first.get("Command Status") else {
        return Ok(());
    };
    let failed = status.get("Status").and_then(Value::as_str) == Some("Failure");
    let description = status
        .get("Description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if failed && description.contains(NO_CONTROLLER_FOUND) {
        return Err(SourceUnusable::NoControllerFound(description.to_string()));
    }
    Ok(())
}

// =============================================================================
// Collection Report
// =============================================================================

/// Summary of one collection cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub source: DataSource,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub controllers: usize,
    pub physical_drives: usize,
    pub virtual_drives: usize,
    pub batteries: usize,
    /// Devices found by discovery (fallback only)
    pub devices: usize,
    /// Gauge values written
    pub measurements: usize,
    /// Gauge writes the sink rejected
    pub failed_writes: usize,
}

impl CollectionReport {
    fn new(source: DataSource, started_at: DateTime<Utc>) -> Self {
        Self {
            source,
            started_at,
            elapsed_ms: 0,
            controllers: 0,
            physical_drives: 0,
            virtual_drives: 0,
            batteries: 0,
            devices: 0,
            measurements: 0,
            failed_writes: 0,
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs collection cycles against a command runner and a measurement sink.
pub struct SourceOrchestrator {
    config: CollectorConfig,
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn MeasurementSink>,
}

impl SourceOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        config: CollectorConfig,
        runner: Arc<dyn CommandRunner>,
        sink: Arc<dyn MeasurementSink>,
    ) -> Self {
        Self {
            config,
            runner,
            sink,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run one cycle. Never fails; problems are logged and reflected in the
    /// report.
    #[instrument(skip(self))]
    pub async fn collect(&self) -> CollectionReport {
        let started = Instant::now();
        let started_at = Utc::now();

        self.sink.reset();

        let report = match self.load_controller_dump().await {
            Some(root) => {
                let mut report = CollectionReport::new(DataSource::Controller, started_at);
                self.collect_from_controllers(&root, &mut report).await;
                report
            }
            None => {
                let mut report = CollectionReport::new(DataSource::Fallback, started_at);
                self.collect_from_devices(&mut report).await;
                report
            }
        };

        CollectionReport {
            elapsed_ms: started.elapsed().as_millis() as u64,
            ..report
        }
    }

    /// Run and decode the controller dump. `None` selects the fallback.
    async fn load_controller_dump(&self) -> Option<Value> {
        let output = match self.runner.run(&self.config.controller_dump_command()).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "Controller tool unavailable, using esxcli fallback");
                return None;
            }
        };

        let root = match decode_controller_dump(&output) {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "Could not decode controller tool output, using esxcli fallback");
                return None;
            }
        };

        match check_structured_response(&root) {
            Ok(()) => Some(root),
            Err(reason) => {
                info!(%reason, "No usable RAID controller, using esxcli fallback");
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Controller path
    // -------------------------------------------------------------------------

    async fn collect_from_controllers(&self, root: &Value, report: &mut CollectionReport) {
        let mut topology = extract_topology(root);

        for drive in &mut topology.physical_drives {
            drive.smart = self.fetch_drive_smart(&drive.smart_path()).await;
        }

        self.publish_topology(&topology, report);
    }

    async fn fetch_drive_smart(&self, drive_path: &str) -> SmartAttributes {
        let output = match self.runner.run(&self.config.drive_smart_command(drive_path)).await {
            Ok(output) => output,
            Err(e) => {
                warn!(drive = drive_path, error = %e, "Error getting SMART data");
                return SmartAttributes::new();
            }
        };

        match extract_smart_hex(&output) {
            Some(hex) => decode_smart_hex(&hex),
            None => {
                debug!(drive = drive_path, "No SMART data in controller output");
                SmartAttributes::new()
            }
        }
    }

    fn publish_topology(&self, topology: &ControllerTopology, report: &mut CollectionReport) {
        report.controllers = topology.controllers.len();
        report.physical_drives = topology.physical_drives.len();
        report.virtual_drives = topology.virtual_drives.len();
        report.batteries = topology.batteries.len();

        for controller in &topology.controllers {
            let id = controller.id.as_str();
            self.publish(
                report,
                Metric::ControllerInfo,
                &[id, &controller.model, &controller.serial, &controller.firmware],
                1.0,
            );
            self.publish(report, Metric::ControllerStatus, &[id], flag(controller.optimal));
            if let Some(temperature) = controller.temperature {
                self.publish(report, Metric::ControllerTemperature, &[id], temperature);
            }
        }

        for drive in &topology.physical_drives {
            let label = drive.label();
            let controller = drive.controller.as_str();
            self.publish(
                report,
                Metric::DriveStatus,
                &[controller, &label, &drive.model, &drive.protocol],
                flag(drive.online),
            );
            if let Some(temperature) = drive.temperature {
                self.publish(report, Metric::DriveTemp, &[controller, &label], temperature);
            }
            for (attribute, value) in &drive.smart {
                self.publish(report, Metric::DriveSmart, &[controller, &label, attribute], *value);
            }
        }

        for volume in &topology.virtual_drives {
            self.publish(
                report,
                Metric::VirtualDriveStatus,
                &[&volume.controller, &volume.label()],
                flag(volume.optimal),
            );
        }

        for battery in &topology.batteries {
            self.publish(report, Metric::BbuHealth, &[&battery.controller], flag(battery.healthy));
        }

        info!(
            controllers = report.controllers,
            physical_drives = report.physical_drives,
            virtual_drives = report.virtual_drives,
            "Published controller topology"
        );
    }

    // -------------------------------------------------------------------------
    // Fallback path
    // -------------------------------------------------------------------------

    async fn collect_from_devices(&self, report: &mut CollectionReport) {
        let host = self.config.host_label.as_str();
        self.publish(report, Metric::SmartctlInfo, &[host], 1.0);

        let devices = match self.runner.run(&self.config.device_list_command()).await {
            Ok(output) => scan_device_list(&output),
            Err(e) => {
                warn!(error = %e, "Failed to list storage devices");
                Vec::new()
            }
        };
        report.devices = devices.len();
        info!(devices = devices.len(), "Discovered storage devices");

        for device in &devices {
            let name = device.display_name.as_str();
            let model = device.model_label();
            let protocol = device.protocol.to_string();

            self.publish(
                report,
                Metric::SmartctlDrive,
                &[host, name, &device.id, model, &protocol],
                1.0,
            );
            self.publish(
                report,
                Metric::DriveStatus,
                &[FALLBACK_CONTROLLER, name, model, &protocol],
                1.0,
            );

            let smart = self.fetch_device_smart(&device.id).await;
            for (attribute, value) in &smart {
                self.publish(
                    report,
                    Metric::DriveSmart,
                    &[FALLBACK_CONTROLLER, name, attribute],
                    *value,
                );
            }
        }
    }

    async fn fetch_device_smart(&self, device_id: &str) -> SmartAttributes {
        match self.runner.run(&self.config.device_smart_command(device_id)).await {
            Ok(output) => parse_smart_table(&output),
            Err(e) => {
                info!(device_id, error = %e, "No SMART data for device (expected for logical drives)");
                SmartAttributes::new()
            }
        }
    }

    fn publish(&self, report: &mut CollectionReport, metric: Metric, labels: &[&str], value: f64) {
        match self.sink.set(metric, labels, value) {
            Ok(()) => report.measurements += 1,
            Err(e) => {
                report.failed_writes += 1;
                warn!(%metric, error = %e, "Failed to write measurement");
            }
        }
    }
}

impl std::fmt::Debug for SourceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceOrchestrator")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemorySink, StaticCommandRunner};
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_decode_controller_dump() {
        assert_matches!(
            decode_controller_dump("perccli: command not found"),
            Err(crate::error::Error::Json(_))
        );
        let root = decode_controller_dump(r#"{"Controllers": []}"#).unwrap();
        assert_eq!(
            check_structured_response(&root),
            Err(SourceUnusable::NoControllers)
        );
    }

    #[test]
    fn test_missing_controllers_is_unusable() {
        assert_eq!(
            check_structured_response(&json!({})),
            Err(SourceUnusable::NoControllers)
        );
        assert_eq!(
            check_structured_response(&json!({ "Controllers": [] })),
            Err(SourceUnusable::NoControllers)
        );
    }

    #[test]
    fn test_no_controller_found_is_unusable() {
        let root = json!({
            "Controllers": [{
                "Command Status": {
                    "Status": "Failure",
                    "Description": "No Controller found"
                }
            }]
        });

        assert_matches!(
            check_structured_response(&root),
            Err(SourceUnusable::NoControllerFound(d)) if d == "No Controller found"
        );
    }

    #[test]
    fn test_other_failures_keep_structured_source() {
        let root = json!({
            "Controllers": [{
                "Command Status": { "Status": "Failure", "Description": "Un-supported command" }
            }]
        });
        assert!(check_structured_response(&root).is_ok());

        let root = json!({
            "Controllers": [{
                "Command Status": { "Status": "Success", "Description": "None" },
                "Response Data": {}
            }]
        });
        assert!(check_structured_response(&root).is_ok());
    }

    #[test]
    fn test_only_first_controller_is_checked() {
        let root = json!({
            "Controllers": [
                { "Command Status": { "Status": "Success" } },
                { "Command Status": { "Status": "Failure", "Description": "No Controller found" } }
            ]
        });
        assert!(check_structured_response(&root).is_ok());
    }

    #[tokio::test]
    async fn test_undecodable_dump_selects_fallback() {
        let config = CollectorConfig::default();
        let runner = Arc::new(
            StaticCommandRunner::new()
                .with_output(config.controller_dump_command(), "perccli: not JSON")
                .with_output(config.device_list_command(), ""),
        );
        let sink = Arc::new(InMemorySink::new());

        let orchestrator = SourceOrchestrator::new(config, runner.clone(), sink.clone());
        let report = orchestrator.collect().await;

        assert_eq!(report.source, DataSource::Fallback);
        assert_eq!(report.devices, 0);
        assert_eq!(sink.get(Metric::SmartctlInfo, &["localhost"]), Some(1.0));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_drive_smart_failure_still_publishes_drive() {
        let config = CollectorConfig::default();
        let dump = json!({
            "Controllers": [{
                "Command Status": { "Status": "Success" },
                "Response Data": {
                    "Basics": { "Controller": 0, "Model": "PERC H730P Mini", "Serial Number": "5A1B2C" },
                    "Version": { "Firmware Version": "25.5.9.0001", "Driver Name": "lsi-mr3" },
                    "Status": { "Controller Status": "Optimal", "BBU Status": 0 },
                    "PD LIST": [
                        { "EID:Slt": "32:0", "State": "Onln", "Model": "ST4000NM0035", "Intf": "SATA" }
                    ]
                }
            }]
        });
        let runner = Arc::new(
            StaticCommandRunner::new()
                .with_output(config.controller_dump_command(), dump.to_string())
                .with_timeout(config.drive_smart_command("/c0/e32/s0"), ""),
        );
        let sink = Arc::new(InMemorySink::new());

        let report = SourceOrchestrator::new(config, runner, sink.clone())
            .collect()
            .await;

        assert_eq!(report.source, DataSource::Controller);
        assert_eq!(report.physical_drives, 1);
        assert_eq!(
            sink.get(
                Metric::DriveStatus,
                &["0", "Drive /c0/e32/s0", "ST4000NM0035", "SATA"]
            ),
            Some(1.0)
        );
        assert_eq!(sink.count(Metric::DriveSmart), 0);
        assert_eq!(sink.get(Metric::BbuHealth, &["0"]), Some(1.0));
    }

    #[test]
    fn test_data_source_display() {
        assert_eq!(DataSource::Controller.to_string(), "controller");
        assert_eq!(DataSource::Fallback.to_string(), "fallback");
        assert_eq!(
            serde_json::to_string(&DataSource::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
