//! SMART Attribute Decoding
//!
//! Two decoders producing the same shape, a map of canonical attribute name to
//! value:
//!
//! - [`binary`] - the hex-encoded attribute table embedded in the RAID
//!   controller tool's `show smart` output
//! - [`tabular`] - the plain-text attribute table printed by `smartctl -a`
//!
//! Names are lowercase and underscore-separated. The wear-leveling attribute is
//! always published as a `_raw`/`_value` pair.

pub mod binary;
pub mod tabular;

mod proptest;

use std::borrow::Cow;
use std::collections::BTreeMap;

pub use binary::{decode_smart_bytes, decode_smart_hex, extract_smart_hex};
pub use tabular::parse_smart_table;

/// Attribute name to value. Ordered so published label sets are stable.
pub type SmartAttributes = BTreeMap<String, f64>;

/// Canonical name of the wear-leveling attribute.
pub const WEAR_LEVELING_COUNT: &str = "wear_leveling_count";

/// Known attribute ids. Anything else is reported as `unknown_<hex id>`.
const ATTRIBUTE_NAMES: [(u8, &str); 32] = [
    (0x01, "raw_read_error_rate"),
    (0x03, "spin_up_time"),
    (0x04, "start_stop_count"),
    (0x05, "reallocated_sector_count"),
    (0x07, "seek_error_rate"),
    (0x09, "power_on_hours"),
    (0x0C, "power_cycle_count"),
    (0x53, "initial_bad_block_count"),
    (0xB1, WEAR_LEVELING_COUNT),
    (0xB3, "used_reserved_block_count_total"),
    (0xB4, "unused_reserved_block_count_total"),
    (0xB5, "program_fail_count_total"),
    (0xB6, "erase_fail_count_total"),
    (0xB7, "runtime_bad_block"),
    (0xB8, "end_to_end_error"),
    (0xBB, "uncorrectable_error_count"),
    (0xBE, "airflow_temperature_celsius"),
    (0xC2, "temperature_celsius"),
    (0xC3, "hardware_ecc_recovered"),
    (0xC5, "current_pending_sector_count"),
    (0xC6, "uncorrectable_sector_count"),
    (0xC7, "udma_crc_error_count"),
    (0xCA, "data_address_mark_errors"),
    (0xEB, "por_recovery_count"),
    (0xF1, "total_host_writes"),
    (0xF2, "total_host_reads"),
    (0xF3, "total_host_writes_expanded"),
    (0xF4, "total_host_reads_expanded"),
    (0xF5, "remaining_rated_write_endurance"),
    (0xF6, "cumulative_host_sectors_written"),
    (0xF7, "host_program_page_count"),
    (0xFB, "minimum_spares_remaining"),
];

/// Canonical name for a SMART attribute id.
pub fn attribute_name(id: u8) -> Cow<'static, str> {
    ATTRIBUTE_NAMES
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, name)| Cow::Borrowed(*name))
        .unwrap_or_else(|| Cow::Owned(format!("unknown_{:x}", id)))
}

/// Insert the `_raw`/`_value` pair used for wear leveling.
pub(crate) fn insert_pair(attributes: &mut SmartAttributes, name: &str, raw: f64, value: f64) {
    attributes.insert(format!("{}_raw", name), raw);
    attributes.insert(format!("{}_value", name), value);
}
