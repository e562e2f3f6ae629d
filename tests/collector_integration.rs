//! Collector Integration Tests
//!
//! End-to-end collection cycles driven by canned tool output:
//! - Controller path: perccli JSON dump and per-drive SMART hex
//! - Fallback path: esxcli device listing and smartctl tables
//! - Reset-then-repopulate across cycles

use std::sync::Arc;

use serde_json::{json, Value};

use esxi_raid_exporter::adapters::{InMemorySink, PrometheusSink, StaticCommandRunner};
use esxi_raid_exporter::collector::{CollectorConfig, DataSource, SourceOrchestrator};
use esxi_raid_exporter::domain::Metric;

// =============================================================================
// Fixtures
// =============================================================================

const NO_CONTROLLER_FOUND: &str = r#"{
  "Controllers": [
    {
      "Command Status": {
        "CLI Version": "007.1910.0000.0000 Oct 08, 2021",
        "Operating system": "VMkernel 7.0.3",
        "Status Code": 0,
        "Status": "Failure",
        "Description": "No Controller found"
      }
    }
  ]
}"#;

const DEVICE_LIST: &str = "\
naa.55cd2e404b6f84e5
   Display Name: Local ATA Disk (naa.55cd2e404b6f84e5)
   Has Settable Display Name: true
   Size: 457862
   Vendor: ATA
   Model: INTEL SSDSC2KB48
   Is SSD: true

mpx.vmhba32:C0:T0:L0
   Display Name: Local USB Direct-Access (mpx.vmhba32:C0:T0:L0)
   Has Settable Display Name: false
   Vendor: SanDisk
   Is SSD: false
";

const SMARTCTL_TABLE: &str = "\
ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  5 Reallocated_Sector_Ct   0x0032   100   100   000    Old_age   Always       -       0
  9 Power_On_Hours          0x0032   096   096   000    Old_age   Always       -       17532
177 Wear_Leveling_Count     0x0013   095   095   000    Pre-fail  Always       -       42
241 Total_LBAs_Written      0x0032   099   099   000    Old_age   Always       -       81234567
";

const SHOW_SMART: &str = "\
CLI Version = 007.1910.0000.0000 Oct 08, 2021
Operating system = VMkernel 7.0.3
Controller = 0
Status = Success
Description = None


Drive /c0/e32/s0 :
================

Smart Data Info /c0/e32/s0 =
01 00 c2 32 00 64 64 28 00 00 00 00 00 09 32 00 63 63
10 27 00 00 00 00 b1 13 00 5f 5f 2a 00 00 00 00 00

";

fn controller_dump(response_data: Value) -> String {
    json!({
        "Controllers": [{
            "Command Status": {
                "Controller": 0,
                "Status": "Success",
                "Description": "None"
            },
            "Response Data": response_data
        }]
    })
    .to_string()
}

fn optimal_controller() -> Value {
    json!({
        "Basics": {
            "Controller": 0,
            "Model": "PERC H730P Mini",
            "Serial Number": "5A1B2C3D",
        },
        "Version": {
            "Firmware Version": "25.5.9.0001",
            "Driver Name": "lsi-mr3"
        },
        "Status": {
            "Controller Status": "Optimal",
            "BBU Status": 0
        },
        "HwCfg": {
            "ROC temperature(Degree Celsius)": 52
        },
        "PD LIST": [
            { "EID:Slt": "32:0", "DID": 0, "State": "Onln", "Intf": "SATA", "Med": "SSD", "Model": "INTEL SSDSC2KB48", "Temp": "28C" },
            { "EID:Slt": "32:1", "DID": 1, "State": "Rbld", "Intf": "SAS", "Med": "HDD", "Model": "ST4000NM0035" }
        ],
        "VD LIST": [
            { "DG/VD": "0/0", "TYPE": "RAID1", "State": "Optl" },
            { "DG/VD": "1/1", "TYPE": "RAID0", "State": "Dgrd" }
        ]
    })
}

fn orchestrator(
    config: &CollectorConfig,
    runner: StaticCommandRunner,
) -> (SourceOrchestrator, Arc<StaticCommandRunner>, Arc<InMemorySink>) {
    let runner = Arc::new(runner);
    let sink = Arc::new(InMemorySink::new());
    let orchestrator = SourceOrchestrator::new(config.clone(), runner.clone(), sink.clone());
    (orchestrator, runner, sink)
}

// =============================================================================
// Source Selection
// =============================================================================

mod source_selection {
    use super::*;

    #[tokio::test]
    async fn test_no_controller_found_selects_fallback() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new()
            .with_output(config.controller_dump_command(), NO_CONTROLLER_FOUND)
            .with_output(config.device_list_command(), DEVICE_LIST);
        let (orchestrator, runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(report.source, DataSource::Fallback);
        assert!(runner.was_called(&config.device_list_command()));
        assert_eq!(sink.count(Metric::ControllerInfo), 0);
        assert_eq!(sink.get(Metric::SmartctlInfo, &["localhost"]), Some(1.0));
    }

    #[tokio::test]
    async fn test_optimal_controller_never_runs_discovery() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new().with_output(
            config.controller_dump_command(),
            controller_dump(optimal_controller()),
        );
        let (orchestrator, runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(report.source, DataSource::Controller);
        assert!(!runner.was_called(&config.device_list_command()));
        assert_eq!(sink.count(Metric::SmartctlInfo), 0);
        assert_eq!(sink.count(Metric::SmartctlDrive), 0);
    }

    #[tokio::test]
    async fn test_controller_tool_timeout_selects_fallback() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new()
            .with_timeout(config.controller_dump_command(), "Scanning controllers...")
            .with_output(config.device_list_command(), DEVICE_LIST);
        let (orchestrator, _runner, _sink) = orchestrator(&config, runner);

        assert_eq!(orchestrator.collect().await.source, DataSource::Fallback);
    }

    #[tokio::test]
    async fn test_missing_controller_tool_selects_fallback() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new().with_output(config.device_list_command(), DEVICE_LIST);
        let (orchestrator, _runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(report.source, DataSource::Fallback);
        assert_eq!(report.devices, 2);
        assert_eq!(sink.count(Metric::SmartctlDrive), 2);
    }
}

// =============================================================================
// Controller Path
// =============================================================================

mod controller_path {
    use super::*;

    #[tokio::test]
    async fn test_controller_without_drives_publishes_info_and_status_only() {
        let config = CollectorConfig::default();
        let response = json!({
            "Basics": { "Controller": "0", "Model": "PERC H330 Mini", "Serial Number": "29K00XY" },
            "Version": { "Firmware Version": "25.5.6.0009", "Driver Name": "lsi-mr3" },
            "Status": { "Controller Status": "Optimal" }
        });
        let runner = StaticCommandRunner::new()
            .with_output(config.controller_dump_command(), controller_dump(response));
        let (orchestrator, _runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.get(
                Metric::ControllerInfo,
                &["0", "PERC H330 Mini", "29K00XY", "25.5.6.0009"]
            ),
            Some(1.0)
        );
        assert_eq!(sink.get(Metric::ControllerStatus, &["0"]), Some(1.0));
        assert_eq!(report.measurements, 2);
        assert_eq!(report.failed_writes, 0);
    }

    #[tokio::test]
    async fn test_full_topology() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new()
            .with_output(
                config.controller_dump_command(),
                controller_dump(optimal_controller()),
            )
            .with_output(config.drive_smart_command("/c0/e32/s0"), SHOW_SMART)
            .with_failure(
                config.drive_smart_command("/c0/e32/s1"),
                "exit status: 1: SMART not supported",
            );
        let (orchestrator, runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(report.controllers, 1);
        assert_eq!(report.physical_drives, 2);
        assert_eq!(report.virtual_drives, 2);
        assert_eq!(report.batteries, 1);
        assert_eq!(runner.calls().len(), 3);

        assert_eq!(sink.get(Metric::ControllerTemperature, &["0"]), Some(52.0));
        assert_eq!(sink.get(Metric::BbuHealth, &["0"]), Some(1.0));

        assert_eq!(
            sink.get(
                Metric::DriveStatus,
                &["0", "Drive /c0/e32/s0", "INTEL SSDSC2KB48", "SATA"]
            ),
            Some(1.0)
        );
        assert_eq!(
            sink.get(
                Metric::DriveStatus,
                &["0", "Drive /c0/e32/s1", "ST4000NM0035", "SAS"]
            ),
            Some(0.0)
        );
        assert_eq!(sink.get(Metric::DriveTemp, &["0", "Drive /c0/e32/s0"]), Some(28.0));
        assert_eq!(sink.get(Metric::DriveTemp, &["0", "Drive /c0/e32/s1"]), None);

        let drive = "Drive /c0/e32/s0";
        assert_eq!(
            sink.get(Metric::DriveSmart, &["0", drive, "temperature_celsius"]),
            Some(40.0)
        );
        assert_eq!(
            sink.get(Metric::DriveSmart, &["0", drive, "power_on_hours"]),
            Some(10000.0)
        );
        assert_eq!(
            sink.get(Metric::DriveSmart, &["0", drive, "wear_leveling_count_raw"]),
            Some(42.0)
        );
        assert_eq!(
            sink.get(Metric::DriveSmart, &["0", drive, "wear_leveling_count_value"]),
            Some(95.0)
        );
        assert_eq!(sink.count(Metric::DriveSmart), 4);

        assert_eq!(sink.get(Metric::VirtualDriveStatus, &["0", "DG0/VD0"]), Some(1.0));
        assert_eq!(sink.get(Metric::VirtualDriveStatus, &["0", "DG1/VD1"]), Some(0.0));
    }

    #[tokio::test]
    async fn test_non_raid_driver_reports_controller_only() {
        let config = CollectorConfig::default();
        let mut response = optimal_controller();
        response["Version"]["Driver Name"] = json!("nhpsa");
        let runner = StaticCommandRunner::new()
            .with_output(config.controller_dump_command(), controller_dump(response));
        let (orchestrator, runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(report.physical_drives, 0);
        assert_eq!(sink.count(Metric::DriveStatus), 0);
        assert_eq!(sink.count(Metric::BbuHealth), 0);
        assert_eq!(sink.count(Metric::ControllerInfo), 1);
        assert_eq!(runner.calls().len(), 1);
    }
}

// =============================================================================
// Fallback Path
// =============================================================================

mod fallback_path {
    use super::*;

    #[tokio::test]
    async fn test_devices_and_smart_tables() {
        let config = CollectorConfig {
            host_label: "esx01.lab".to_string(),
            ..Default::default()
        };
        let runner = StaticCommandRunner::new()
            .with_output(config.controller_dump_command(), NO_CONTROLLER_FOUND)
            .with_output(config.device_list_command(), DEVICE_LIST)
            .with_output(
                config.device_smart_command("naa.55cd2e404b6f84e5"),
                SMARTCTL_TABLE,
            )
            .with_failure(
                config.device_smart_command("mpx.vmhba32:C0:T0:L0"),
                "exit status: 2: Smartctl open device failed",
            );
        let (orchestrator, _runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(report.devices, 2);
        assert_eq!(sink.get(Metric::SmartctlInfo, &["esx01.lab"]), Some(1.0));
        assert_eq!(
            sink.get(
                Metric::SmartctlDrive,
                &[
                    "esx01.lab",
                    "Local ATA Disk",
                    "naa.55cd2e404b6f84e5",
                    "INTEL SSDSC2KB48",
                    "SSD"
                ]
            ),
            Some(1.0)
        );
        assert_eq!(
            sink.get(
                Metric::DriveStatus,
                &["esxcli", "Local ATA Disk", "INTEL SSDSC2KB48", "SSD"]
            ),
            Some(1.0)
        );

        let smart = sink.series(Metric::DriveSmart);
        let attributes: Vec<&str> = smart.iter().map(|(labels, _)| labels[2].as_str()).collect();
        assert_eq!(
            attributes,
            vec![
                "power_on_hours",
                "reallocated_sector_ct",
                "total_lbas_written",
                "wear_leveling_count_raw",
                "wear_leveling_count_value",
            ]
        );
        assert!(smart.iter().all(|(labels, _)| labels[0] == "esxcli"));
        assert_eq!(
            sink.get(
                Metric::DriveSmart,
                &["esxcli", "Local ATA Disk", "wear_leveling_count_value"]
            ),
            Some(95.0)
        );
    }

    #[tokio::test]
    async fn test_device_without_model_or_protocol_is_unknown() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new()
            .with_output(config.controller_dump_command(), NO_CONTROLLER_FOUND)
            .with_output(config.device_list_command(), DEVICE_LIST);
        let (orchestrator, _runner, sink) = orchestrator(&config, runner);

        orchestrator.collect().await;

        assert_eq!(
            sink.get(
                Metric::DriveStatus,
                &["esxcli", "Local USB Direct-Access", "Unknown", "Unknown"]
            ),
            Some(1.0)
        );
        assert_eq!(sink.count(Metric::DriveSmart), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_publishes_marker_only() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new()
            .with_output(config.controller_dump_command(), NO_CONTROLLER_FOUND)
            .with_failure(config.device_list_command(), "exit status: 1");
        let (orchestrator, _runner, sink) = orchestrator(&config, runner);

        let report = orchestrator.collect().await;

        assert_eq!(report.devices, 0);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.get(Metric::SmartctlInfo, &["localhost"]), Some(1.0));
    }
}

// =============================================================================
// Exposition
// =============================================================================

mod exposition {
    use super::*;

    #[tokio::test]
    async fn test_reset_clears_previous_cycle() {
        let config = CollectorConfig::default();
        let sink = Arc::new(PrometheusSink::new().unwrap());

        let primary = SourceOrchestrator::new(
            config.clone(),
            Arc::new(StaticCommandRunner::new().with_output(
                config.controller_dump_command(),
                controller_dump(optimal_controller()),
            )),
            sink.clone(),
        );
        primary.collect().await;
        let text = sink.encode_to_string().unwrap();
        assert!(text.contains("esxi_controller_status{controller=\"0\"} 1"));

        let fallback = SourceOrchestrator::new(
            config.clone(),
            Arc::new(
                StaticCommandRunner::new()
                    .with_output(config.controller_dump_command(), NO_CONTROLLER_FOUND)
                    .with_output(config.device_list_command(), DEVICE_LIST),
            ),
            sink.clone(),
        );
        fallback.collect().await;
        let text = sink.encode_to_string().unwrap();

        assert!(!text.contains("esxi_controller_status{"));
        assert!(!text.contains("esxi_virtual_drive_status{"));
        assert!(text.contains("esxi_smartctl_info{host=\"localhost\"} 1"));
        assert!(text.contains(
            "esxi_drive_status{controller=\"esxcli\",drive=\"Local USB Direct-Access\",model_name=\"Unknown\",protocol=\"Unknown\"} 1"
        ));
    }

    #[tokio::test]
    async fn test_repeated_cycles_are_stable() {
        let config = CollectorConfig::default();
        let runner = StaticCommandRunner::new()
            .with_output(config.controller_dump_command(), NO_CONTROLLER_FOUND)
            .with_output(config.device_list_command(), DEVICE_LIST);
        let (orchestrator, _runner, sink) = orchestrator(&config, runner);

        orchestrator.collect().await;
        let first = sink.len();
        orchestrator.collect().await;

        assert_eq!(sink.len(), first);
        assert_eq!(sink.reset_count(), 2);
    }
}
