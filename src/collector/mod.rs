//! Collection Cycle
//!
//! Ties the extraction core to the ports: picks a data source, runs the
//! tools, and republishes every measurement once per cycle.
//!
//! # Data Sources
//!
//! ```text
//!   perccli /cALL show all J ──ok──▶ topology walk ──▶ per-drive SMART (perccli)
//!            │
//!         unusable
//!            ▼
//!   esxcli device list ──▶ discovery scan ──▶ per-device SMART (smartctl)
//! ```
//!
//! The choice is made once per cycle; the two sources are never mixed.

mod orchestrator;
mod schedule;

pub use orchestrator::{
    check_structured_response, decode_controller_dump, CollectionReport, DataSource,
    SourceOrchestrator, SourceUnusable,
};
pub use schedule::{run_once, run_periodic, DEFAULT_RESCAN_INTERVAL};

// =============================================================================
// Configuration
// =============================================================================

/// Tool locations and the host label for the fallback path.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Value of the `host` label on fallback metrics
    pub host_label: String,
    /// Directory holding the `perccli` binary
    pub perccli_dir: String,
    /// Directory holding the `smartctl` binary
    pub smartctl_dir: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host_label: "localhost".to_string(),
            perccli_dir: "/opt/lsi/perccli".to_string(),
            smartctl_dir: "/opt/smartmontools".to_string(),
        }
    }
}

impl CollectorConfig {
    /// Full JSON dump of every controller.
    pub fn controller_dump_command(&self) -> String {
        format!("cd {} && ./perccli /cALL show all J", self.perccli_dir)
    }

    /// SMART hex dump for one physical drive (e.g., `/c0/e32/s0`).
    pub fn drive_smart_command(&self, drive_path: &str) -> String {
        format!("cd {} && ./perccli {} show smart", self.perccli_dir, drive_path)
    }

    /// Host storage device listing.
    pub fn device_list_command(&self) -> String {
        "esxcli storage core device list".to_string()
    }

    /// SMART attribute table for one device, trimmed to the table rows.
    pub fn device_smart_command(&self, device_id: &str) -> String {
        format!(
            "cd {} && ./smartctl -a -d sat /dev/disks/{} | awk '/ID# ATTRIBUTE_NAME/,/Total_LBAs_Written/'",
            self.smartctl_dir, device_id
        )
    }
}
