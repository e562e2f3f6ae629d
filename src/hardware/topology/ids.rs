//! Composite identifiers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// Split `value` on the first `separator` into two non-empty parts.
fn split_pair(value: &str, separator: char, kind: &'static str) -> Result<(String, String), Error> {
    let invalid = || Error::InvalidCompositeId {
        kind,
        value: value.to_string(),
    };

    let (left, right) = value.split_once(separator).ok_or_else(invalid)?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        return Err(invalid());
    }
    Ok((left.to_string(), right.to_string()))
}

/// Physical drive position, parsed from `"<enclosure>:<slot>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EnclosureSlot {
    pub enclosure: String,
    pub slot: String,
}

impl FromStr for EnclosureSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (enclosure, slot) = split_pair(s, ':', "enclosure:slot")?;
        Ok(Self { enclosure, slot })
    }
}

impl fmt::Display for EnclosureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.enclosure, self.slot)
    }
}

/// Virtual drive position, parsed from `"<drive group>/<volume>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DriveGroupId {
    pub drive_group: String,
    pub volume: String,
}

impl FromStr for DriveGroupId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (drive_group, volume) = split_pair(s, '/', "DG/VD")?;
        Ok(Self { drive_group, volume })
    }
}

impl fmt::Display for DriveGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DG{}/VD{}", self.drive_group, self.volume)
    }
}
