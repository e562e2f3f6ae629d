//! Tabular SMART Attribute Parser
//!
//! Parses the attribute table printed by `smartctl -a`:
//!
//! ```text
//! ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
//!   9 Power_On_Hours          0x0032   095   095   000    Old_age   Always       -       24567
//! ```
//!
//! Column 1 is the name, column 3 the normalized value, the last column the
//! raw value. Rows whose raw value is not a plain number (e.g. temperatures
//! with a `(Min/Max ..)` suffix) are rejected.

use tracing::{debug, warn};

use super::{insert_pair, SmartAttributes, WEAR_LEVELING_COUNT};

const HEADER_PREFIX: &str = "ID#";
const MIN_COLUMNS: usize = 10;

/// Scanner position relative to the attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    BeforeHeader,
    InTable,
    Done,
}

/// Parse a smartctl attribute table.
///
/// When the output contains an `ID#` header, lines before it are ignored and
/// the table ends at the first blank line after it. Without a header every
/// non-blank line is a candidate row.
pub fn parse_smart_table(output: &str) -> SmartAttributes {
    let mut attributes = SmartAttributes::new();

    let has_header = output
        .lines()
        .any(|line| line.trim_start().starts_with(HEADER_PREFIX));
    let mut state = if has_header {
        TableState::BeforeHeader
    } else {
        TableState::InTable
    };

    for line in output.lines() {
        let line = line.trim();

        state = match state {
            TableState::BeforeHeader if line.starts_with(HEADER_PREFIX) => TableState::InTable,
            TableState::BeforeHeader => TableState::BeforeHeader,
            TableState::InTable if line.is_empty() && has_header => TableState::Done,
            TableState::InTable => {
                if !line.is_empty() && !line.starts_with(HEADER_PREFIX) {
                    parse_row(line, &mut attributes);
                }
                TableState::InTable
            }
            TableState::Done => break,
        };
    }

    attributes
}

fn parse_row(line: &str, attributes: &mut SmartAttributes) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_COLUMNS {
        warn!(line, "Line does not match SMART format");
        return;
    }

    let name = tokens[1];
    let value = tokens[3];
    let raw = tokens[tokens.len() - 1];

    let Ok(raw) = raw.parse::<f64>() else {
        debug!(attribute = name, raw, "Could not parse raw value as number");
        return;
    };

    let key = canonical_name(name);
    if key == WEAR_LEVELING_COUNT {
        match value.parse::<f64>() {
            Ok(value) => insert_pair(attributes, &key, raw, value),
            Err(_) => warn!(attribute = name, value, "Could not parse normalized value"),
        }
    } else {
        attributes.insert(key, raw);
    }
}

/// Lowercase, hyphens to underscores.
fn canonical_name(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}
