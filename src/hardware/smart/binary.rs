//! Binary SMART Attribute Decoder
//!
//! Decodes the vendor attribute table the RAID controller tool prints as hex.
//!
//! # Layout
//!
//! ```text
//! [01 00 | 2F 00]            optional 2-byte header
//! ┌────┬───────┬─────┬──────┬──────────────────────┐
//! │ id │ flags │ val │ worst│ raw (6 bytes, LE)    │   11 bytes per record
//! └────┴───────┴─────┴──────┴──────────────────────┘
//!   0    1..3    3     4      5..11
//! ```
//!
//! A zero id marks padding or misalignment: the scan advances one byte and
//! tries again rather than skipping a whole record.

use tracing::debug;

use super::{attribute_name, insert_pair, SmartAttributes};

/// Size of one attribute record.
const RECORD_LEN: usize = 11;

/// Leading byte pairs that are a header rather than a record.
const HEADERS: [[u8; 2]; 2] = [[0x01, 0x00], [0x2F, 0x00]];

const ID_WEAR_LEVELING: u8 = 0xB1;
const ID_TEMPERATURE: u8 = 0xC2;

/// Marker preceding the hex payload in `show smart` output.
const SMART_MARKER: &str = "Smart Data Info";

/// Decode a hex string into SMART attributes.
///
/// Non-hex characters are ignored and a trailing odd nibble is dropped.
pub fn decode_smart_hex(input: &str) -> SmartAttributes {
    decode_smart_bytes(&hex_to_bytes(input))
}

/// Decode raw SMART attribute bytes.
pub fn decode_smart_bytes(bytes: &[u8]) -> SmartAttributes {
    let mut attributes = SmartAttributes::new();

    let mut offset = if has_header(bytes) { 2 } else { 0 };

    while offset + RECORD_LEN <= bytes.len() {
        let id = bytes[offset];
        if id == 0 {
            offset += 1;
            continue;
        }

        let record = &bytes[offset..offset + RECORD_LEN];
        let normalized = record[3];
        let raw_bytes = &record[5..RECORD_LEN];
        let raw = raw_bytes
            .iter()
            .rev()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));

        let name = attribute_name(id);
        match id {
            ID_WEAR_LEVELING => {
                insert_pair(&mut attributes, &name, raw as f64, f64::from(normalized));
            }
            // Only the first raw byte holds the current temperature; the rest
            // carry min/max history.
            ID_TEMPERATURE => {
                attributes.insert(name.into_owned(), f64::from(raw_bytes[0]));
            }
            _ => {
                attributes.insert(name.into_owned(), raw as f64);
            }
        }

        offset += RECORD_LEN;
    }

    if offset < bytes.len() {
        debug!(
            trailing = bytes.len() - offset,
            "Ignoring truncated SMART record tail"
        );
    }

    attributes
}

/// Pull the hex payload out of the controller tool's `show smart` output.
///
/// The payload starts on the line after the `Smart Data Info ... =` marker and
/// runs until the first blank or non-hex line. Line breaks are removed.
pub fn extract_smart_hex(output: &str) -> Option<String> {
    let mut lines = output.lines();
    lines.find(|line| line.contains(SMART_MARKER) && line.trim_end().ends_with('='))?;

    let payload: String = lines
        .map(str::trim_end)
        .take_while(|line| !line.trim().is_empty() && is_hex_line(line))
        .collect();

    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

fn is_hex_line(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_hexdigit() || c == ' ')
}

fn has_header(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && HEADERS.iter().any(|header| bytes[..2] == header[..])
}

fn hex_to_bytes(input: &str) -> Vec<u8> {
    let nibbles: Vec<u8> = input
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();

    nibbles
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect()
}
