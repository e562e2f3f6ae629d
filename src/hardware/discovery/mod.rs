//! Device Discovery
//!
//! Groups the flat `esxcli storage core device list` listing into device
//! records. Each device starts with a bare identifier line and is followed by
//! indented `Key: Value` fields:
//!
//! ```text
//! naa.600508b1001c7e1f
//!    Display Name: Local ATA Disk (naa.600508b1001c7e1f)
//!    Model: Samsung SSD 860
//!    Is SSD: true
//! ```
//!
//! The scanner is a small state machine whose only state is the record being
//! built. Line rules are evaluated in a fixed order and the identifier rule
//! always comes first.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::UNKNOWN;

static DEVICE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:naa|t10|mpx)\.\S+$").expect("device id pattern"));
static DISPLAY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Display Name:\s*(.+)$").expect("display name pattern"));
static DISPLAY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]+\)$").expect("display suffix pattern"));
static MODEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Model:\s*(.+)$").expect("model pattern"));
static IS_SSD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^is ssd:\s*true\b").expect("ssd pattern"));

// =============================================================================
// Device Protocol
// =============================================================================

/// Transport reported for a discovered device.
///
/// The listing carries no rotational flag, so spinning disks stay `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DeviceProtocol {
    /// SATA/SAS SSD
    Ssd,
    /// NVMe SSD
    Nvme,
    /// Not reported
    #[default]
    Unknown,
}

impl std::fmt::Display for DeviceProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceProtocol::Ssd => write!(f, "SSD"),
            DeviceProtocol::Nvme => write!(f, "NVMe"),
            DeviceProtocol::Unknown => write!(f, "{}", UNKNOWN),
        }
    }
}

// =============================================================================
// Discovered Device
// =============================================================================

/// A complete device record from the listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredDevice {
    /// Vendor path token (e.g., naa.600508b1001c7e1f)
    pub id: String,
    /// Display name without its parenthesized suffix
    pub display_name: String,
    /// Model, if reported
    pub model: Option<String>,
    /// Transport
    pub protocol: DeviceProtocol,
}

impl DiscoveredDevice {
    /// Model label, `Unknown` when absent.
    pub fn model_label(&self) -> &str {
        self.model.as_deref().unwrap_or(UNKNOWN)
    }
}

/// A record still being assembled.
#[derive(Debug, Clone, Default)]
struct PendingDevice {
    id: String,
    display_name: Option<String>,
    model: Option<String>,
    protocol: DeviceProtocol,
}

impl PendingDevice {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    fn complete(self) -> Option<DiscoveredDevice> {
        match self.display_name {
            Some(display_name) if !self.id.is_empty() && !display_name.is_empty() => {
                Some(DiscoveredDevice {
                    id: self.id,
                    display_name,
                    model: self.model,
                    protocol: self.protocol,
                })
            }
            _ => None,
        }
    }
}

// =============================================================================
// Scanner
// =============================================================================

/// Line-oriented scanner for device listings.
#[derive(Debug, Default)]
pub struct DeviceDiscoveryScanner {
    current: Option<PendingDevice>,
    devices: Vec<DiscoveredDevice>,
}

impl DeviceDiscoveryScanner {
    /// Create an empty scanner
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the record currently being built.
    pub fn pending_id(&self) -> Option<&str> {
        self.current.as_ref().map(|device| device.id.as_str())
    }

    /// Devices completed so far.
    pub fn devices(&self) -> &[DiscoveredDevice] {
        &self.devices
    }

    /// Feed one line of the listing.
    pub fn feed_line(&mut self, line: &str) {
        let line = line.trim();

        if DEVICE_ID.is_match(line) {
            self.flush();
            self.current = Some(PendingDevice::new(line));
            return;
        }

        let Some(device) = self.current.as_mut() else {
            return;
        };

        if let Some(caps) = DISPLAY_NAME.captures(line) {
            let name = DISPLAY_SUFFIX.replace(caps[1].trim(), "");
            device.display_name = Some(name.into_owned());
        } else if let Some(caps) = MODEL.captures(line) {
            device.model = Some(caps[1].trim().to_string());
        } else if IS_SSD.is_match(line) {
            device.protocol = DeviceProtocol::Ssd;
        } else if line.to_lowercase().contains("nvme") {
            device.protocol = DeviceProtocol::Nvme;
        }
    }

    /// Flush the last record and return every completed device.
    pub fn finish(mut self) -> Vec<DiscoveredDevice> {
        self.flush();
        self.devices
    }

    fn flush(&mut self) {
        let Some(pending) = self.current.take() else {
            return;
        };

        let id = pending.id.clone();
        match pending.complete() {
            Some(device) => {
                debug!(device_id = %device.id, display_name = %device.display_name, "Discovered device");
                self.devices.push(device);
            }
            None => warn!(device_id = %id, "Skipping incomplete device info"),
        }
    }
}

/// Scan a complete device listing.
pub fn scan_device_list(output: &str) -> Vec<DiscoveredDevice> {
    let mut scanner = DeviceDiscoveryScanner::new();
    for line in output.lines() {
        scanner.feed_line(line);
    }
    scanner.finish()
}
