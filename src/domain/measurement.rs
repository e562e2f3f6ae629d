//! Measurement Catalog
//!
//! The fixed set of gauges the exporter publishes, together with their label
//! schemas. Every writer goes through [`Metric`] so the label order used at
//! write time always matches the schema the sink registered.
//!
//! # Example
//!
//! ```
//! use esxi_raid_exporter::domain::Metric;
//!
//! assert_eq!(Metric::DriveTemp.name(), "drive_temp");
//! assert_eq!(Metric::DriveTemp.label_names(), &["controller", "drive"]);
//! ```

use serde::Serialize;

/// Prometheus namespace prepended to every metric name.
pub const NAMESPACE: &str = "esxi";

/// Label value used whenever a source omits a descriptive field.
pub const UNKNOWN: &str = "Unknown";

/// Controller label used for drives discovered through the fallback path.
pub const FALLBACK_CONTROLLER: &str = "esxcli";

// =============================================================================
// Metric
// =============================================================================

/// A published gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ControllerInfo,
    ControllerStatus,
    ControllerTemperature,
    DriveStatus,
    DriveTemp,
    DriveSmart,
    VirtualDriveStatus,
    BbuHealth,
    SmartctlInfo,
    SmartctlDrive,
}

impl Metric {
    /// Every metric, in registration order.
    pub const ALL: [Metric; 10] = [
        Metric::ControllerInfo,
        Metric::ControllerStatus,
        Metric::ControllerTemperature,
        Metric::DriveStatus,
        Metric::DriveTemp,
        Metric::DriveSmart,
        Metric::VirtualDriveStatus,
        Metric::BbuHealth,
        Metric::SmartctlInfo,
        Metric::SmartctlDrive,
    ];

    /// Metric name without the namespace prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::ControllerInfo => "controller_info",
            Metric::ControllerStatus => "controller_status",
            Metric::ControllerTemperature => "controller_temperature",
            Metric::DriveStatus => "drive_status",
            Metric::DriveTemp => "drive_temp",
            Metric::DriveSmart => "drive_smart",
            Metric::VirtualDriveStatus => "virtual_drive_status",
            Metric::BbuHealth => "bbu_health",
            Metric::SmartctlInfo => "smartctl_info",
            Metric::SmartctlDrive => "smartctl_drive",
        }
    }

    /// Metric name as exposed, including the namespace.
    pub fn full_name(&self) -> String {
        format!("{}_{}", NAMESPACE, self.name())
    }

    /// Help text.
    pub fn help(&self) -> &'static str {
        match self {
            Metric::ControllerInfo => "MegaRAID controller info",
            Metric::ControllerStatus => "Controller status (1=Optimal, 0=Not Optimal)",
            Metric::ControllerTemperature => "Controller temperature in Celsius",
            Metric::DriveStatus => "Physical drive status (1=Online, 0=Other)",
            Metric::DriveTemp => "Physical drive temperature in Celsius",
            Metric::DriveSmart => "Drive SMART attributes",
            Metric::VirtualDriveStatus => "Virtual drive status (1=Optimal, 0=Other)",
            Metric::BbuHealth => "Battery Backup Unit health (1=Healthy, 0=Unhealthy)",
            Metric::SmartctlInfo => "Indicates smartctl is used for metrics collection (1=Active)",
            Metric::SmartctlDrive => "Lists drives detected via smartctl on ESXi host",
        }
    }

    /// Label names, in the order label values must be supplied.
    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            Metric::ControllerInfo => &["controller", "model", "serial", "fwversion"],
            Metric::ControllerStatus
            | Metric::ControllerTemperature
            | Metric::BbuHealth => &["controller"],
            Metric::DriveStatus => &["controller", "drive", "model_name", "protocol"],
            Metric::DriveTemp => &["controller", "drive"],
            Metric::DriveSmart => &["controller", "drive", "attribute"],
            Metric::VirtualDriveStatus => &["controller", "vd"],
            Metric::SmartctlInfo => &["host"],
            Metric::SmartctlDrive => &["host", "drive", "device_id", "model_name", "protocol"],
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Gauge value for a boolean state.
pub fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
