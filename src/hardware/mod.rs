//! Hardware Telemetry Extraction
//!
//! Parsers that turn RAID controller and disk tool output into canonical
//! entities. Nothing here runs a command; callers supply the output.
//!
//! # Sources
//!
//! - [`topology`] - structured controller dump (controllers, drives, volumes, battery)
//! - [`smart`] - binary and tabular SMART attribute tables
//! - [`discovery`] - free-text device listing used when no controller is usable
//!
//! # Example
//!
//! ```
//! use esxi_raid_exporter::hardware::discovery::scan_device_list;
//!
//! let listing = "naa.600508b1001c7e1f\n   Display Name: Local ATA Disk (naa.600508b1001c7e1f)\n";
//! let devices = scan_device_list(listing);
//!
//! assert_eq!(devices[0].display_name, "Local ATA Disk");
//! ```

pub mod discovery;
pub mod smart;
pub mod topology;

pub use discovery::{scan_device_list, DeviceDiscoveryScanner, DeviceProtocol, DiscoveredDevice};
pub use smart::{decode_smart_hex, extract_smart_hex, parse_smart_table, SmartAttributes};
pub use topology::{
    extract_topology, BatteryUnit, Controller, ControllerTopology, DriveGroupId, EnclosureSlot,
    PhysicalDrive, VirtualDrive,
};
