//! Controller Topology
//!
//! Walks the structured dump produced by `perccli /cALL show all J` and turns
//! it into canonical entities:
//!
//! ```text
//! Controllers[]
//!   └─ Response Data
//!        ├─ Basics / Version / Status / HwCfg   → Controller
//!        ├─ PD LIST[]                           → PhysicalDrive
//!        ├─ VD LIST[]                           → VirtualDrive
//!        └─ Status."BBU Status"                 → BatteryUnit
//! ```
//!
//! The walk is pure. Fetching per-drive SMART data is left to the caller,
//! using [`PhysicalDrive::smart_path`].
//!
//! A malformed drive or volume entry only drops that entry; a controller
//! without a `Basics` group is skipped on its own.

mod ids;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub use ids::{DriveGroupId, EnclosureSlot};

use crate::domain::UNKNOWN;
use crate::error::Result;
use crate::hardware::smart::SmartAttributes;

/// Drivers whose controllers expose drive, volume and battery details.
pub const RAID_DRIVERS: [&str; 2] = ["megaraid_sas", "lsi-mr3"];

/// Spellings of the controller temperature key across tool versions.
const TEMPERATURE_KEYS: [&str; 2] = [
    "ROC temperature(Degree Celcius)",
    "ROC temperature(Degree Celsius)",
];

/// Battery status codes that mean healthy.
const HEALTHY_BBU_CODES: [f64; 3] = [0.0, 8.0, 4096.0];

/// Battery status sentinel for "no battery".
const BBU_NOT_APPLICABLE: &str = "NA";

// =============================================================================
// Entities
// =============================================================================

/// A RAID controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controller {
    /// Controller index (e.g., "0")
    pub id: String,
    pub model: String,
    pub serial: String,
    pub firmware: String,
    /// Kernel driver name
    pub driver: String,
    /// Controller status is exactly "Optimal"
    pub optimal: bool,
    /// ROC temperature in Celsius
    pub temperature: Option<f64>,
}

impl Controller {
    /// Whether drive, volume and battery details should be read.
    pub fn is_raid(&self) -> bool {
        RAID_DRIVERS.contains(&self.driver.as_str())
    }
}

/// A physical drive behind a controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalDrive {
    pub controller: String,
    pub location: EnclosureSlot,
    pub model: String,
    /// Interface (SATA, SAS, NVMe)
    pub protocol: String,
    /// State is "Onln"
    pub online: bool,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    /// SMART attributes, filled in after the walk
    pub smart: SmartAttributes,
}

impl PhysicalDrive {
    /// Tool path addressing this drive (e.g., /c0/e32/s1).
    pub fn smart_path(&self) -> String {
        format!(
            "/c{}/e{}/s{}",
            self.controller, self.location.enclosure, self.location.slot
        )
    }

    /// Drive label used in published measurements.
    pub fn label(&self) -> String {
        format!("Drive {}", self.smart_path())
    }
}

/// A virtual drive (RAID volume).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualDrive {
    pub controller: String,
    pub id: DriveGroupId,
    /// State is "Optl"
    pub optimal: bool,
}

impl VirtualDrive {
    /// Volume label used in published measurements (e.g., DG0/VD1).
    pub fn label(&self) -> String {
        self.id.to_string()
    }
}

/// Battery backup unit of a controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryUnit {
    pub controller: String,
    pub healthy: bool,
    /// Raw status code, when numeric
    pub status_code: Option<f64>,
}

/// Everything extracted from one structured dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControllerTopology {
    pub controllers: Vec<Controller>,
    pub physical_drives: Vec<PhysicalDrive>,
    pub virtual_drives: Vec<VirtualDrive>,
    pub batteries: Vec<BatteryUnit>,
}

impl ControllerTopology {
    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Extract every controller in a structured dump.
pub fn extract_topology(root: &Value) -> ControllerTopology {
    let mut topology = ControllerTopology::default();

    let Some(entries) = root.get("Controllers").and_then(Value::as_array) else {
        return topology;
    };

    for entry in entries {
        match entry.get("Response Data") {
            Some(response) if response.is_object() => extract_controller(response, &mut topology),
            _ => debug!("Controller entry has no response data"),
        }
    }

    topology
}

/// Extract one controller's `Response Data` group into `topology`.
pub fn extract_controller(response: &Value, topology: &mut ControllerTopology) {
    let Some(controller) = parse_controller(response) else {
        warn!("Controller response has no Basics group, skipping");
        return;
    };

    if controller.is_raid() {
        extract_raid_details(&controller.id, response, topology);
    } else {
        debug!(
            controller = %controller.id,
            driver = %controller.driver,
            "Driver is not a RAID driver, reporting controller only"
        );
    }

    topology.controllers.push(controller);
}

fn parse_controller(response: &Value) -> Option<Controller> {
    let basics = response.get("Basics").filter(|b| b.is_object())?;
    let version = response.get("Version");
    let status = response.get("Status");

    let id = text(basics, "Controller").unwrap_or_else(|| UNKNOWN.to_string());
    let optimal = status
        .and_then(|s| s.get("Controller Status"))
        .and_then(Value::as_str)
        == Some("Optimal");

    let temperature = response.get("HwCfg").and_then(|hw| {
        let value = TEMPERATURE_KEYS.iter().find_map(|key| hw.get(*key))?;
        let parsed = number(value);
        if parsed.is_none() {
            warn!(controller = %id, ?value, "Could not parse controller temperature");
        }
        parsed
    });

    Some(Controller {
        model: text(basics, "Model").unwrap_or_else(|| UNKNOWN.to_string()),
        serial: text(basics, "Serial Number").unwrap_or_else(|| UNKNOWN.to_string()),
        firmware: version
            .and_then(|v| text(v, "Firmware Version"))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        driver: version
            .and_then(|v| text(v, "Driver Name"))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        id,
        optimal,
        temperature,
    })
}

fn extract_raid_details(controller: &str, response: &Value, topology: &mut ControllerTopology) {
    if let Some(drives) = response.get("PD LIST").and_then(Value::as_array) {
        for entry in drives {
            match parse_physical_drive(controller, entry) {
                Ok(drive) => topology.physical_drives.push(drive),
                Err(e) => warn!(controller, error = %e, "Skipping physical drive"),
            }
        }
    }

    if let Some(volumes) = response.get("VD LIST").and_then(Value::as_array) {
        for entry in volumes {
            match parse_virtual_drive(controller, entry) {
                Ok(volume) => topology.virtual_drives.push(volume),
                Err(e) => warn!(controller, error = %e, "Skipping virtual drive"),
            }
        }
    }

    if let Some(battery) = response
        .get("Status")
        .and_then(|status| status.get("BBU Status"))
        .and_then(|code| parse_battery(controller, code))
    {
        topology.batteries.push(battery);
    }
}

/// Parse one `PD LIST` entry.
pub fn parse_physical_drive(controller: &str, entry: &Value) -> Result<PhysicalDrive> {
    let location: EnclosureSlot = text(entry, "EID:Slt").unwrap_or_default().parse()?;

    let temperature = entry.get("Temp").and_then(|temp| {
        let parsed = match temp {
            Value::String(s) => s.trim().trim_end_matches('C').trim().parse::<f64>().ok(),
            other => number(other),
        };
        if parsed.is_none() {
            warn!(controller, drive = %location, ?temp, "Could not parse drive temperature");
        }
        parsed
    });

    Ok(PhysicalDrive {
        controller: controller.to_string(),
        online: entry.get("State").and_then(Value::as_str) == Some("Onln"),
        model: text(entry, "Model").unwrap_or_else(|| UNKNOWN.to_string()),
        protocol: text(entry, "Intf").unwrap_or_else(|| UNKNOWN.to_string()),
        location,
        temperature,
        smart: SmartAttributes::new(),
    })
}

/// Parse one `VD LIST` entry.
pub fn parse_virtual_drive(controller: &str, entry: &Value) -> Result<VirtualDrive> {
    let id: DriveGroupId = text(entry, "DG/VD").unwrap_or_default().parse()?;

    Ok(VirtualDrive {
        controller: controller.to_string(),
        optimal: entry.get("State").and_then(Value::as_str) == Some("Optl"),
        id,
    })
}

/// Interpret a `BBU Status` value. `None` when no battery is fitted.
pub fn parse_battery(controller: &str, code: &Value) -> Option<BatteryUnit> {
    if code.is_null() || code.as_str().map(str::trim) == Some(BBU_NOT_APPLICABLE) {
        return None;
    }

    let status_code = number(code);
    if status_code.is_none() {
        warn!(controller, ?code, "Unrecognized BBU status");
    }

    Some(BatteryUnit {
        controller: controller.to_string(),
        healthy: status_code.is_some_and(|c| HEALTHY_BBU_CODES.contains(&c)),
        status_code,
    })
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Read a field as text. Numbers are rendered, other types are absent.
fn text(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a value as a number, accepting numeric strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
