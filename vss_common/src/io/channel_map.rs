//! Header pin → logical channel resolution.
//!
//! The Raspberry Pi model B shipped with two header layouts. Both expose the
//! same 26-pin connector but three positions are wired to different BCM
//! lines, so the revision tag must be known before any pin can be resolved.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logical channel identifier used by the I/O driver (BCM numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Channel(pub u8);

impl Channel {
    /// Raw BCM line number.
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BCM{}", self.0)
    }
}

/// Channel resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelMapError {
    #[error("unknown hardware revision {0:?}, expected \"rev1\" or \"rev2\"")]
    UnknownRevision(String),

    #[error("pin {pin} is not a GPIO pin on {revision}")]
    UnmappedPin { pin: i64, revision: HardwareRevision },
}

// ─── HardwareRevision ───────────────────────────────────────────────

/// Supported header revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareRevision {
    Rev1,
    Rev2,
}

/// Header pin → BCM line, revision 1 board.
const REV1_TABLE: [(i64, u8); 17] = [
    (3, 0),
    (5, 1),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 21),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
];

/// Header pin → BCM line, revision 2 board.
const REV2_TABLE: [(i64, u8); 17] = [
    (3, 2),
    (5, 3),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
];

impl HardwareRevision {
    fn table(self) -> &'static [(i64, u8)] {
        match self {
            Self::Rev1 => &REV1_TABLE,
            Self::Rev2 => &REV2_TABLE,
        }
    }

    /// Resolve a header pin on this revision.
    pub fn resolve(self, pin: i64) -> Result<Channel, ChannelMapError> {
        self.table()
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, bcm)| Channel(*bcm))
            .ok_or(ChannelMapError::UnmappedPin {
                pin,
                revision: self,
            })
    }
}

impl fmt::Display for HardwareRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rev1 => write!(f, "rev1"),
            Self::Rev2 => write!(f, "rev2"),
        }
    }
}

impl FromStr for HardwareRevision {
    type Err = ChannelMapError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rev1" => Ok(Self::Rev1),
            "rev2" => Ok(Self::Rev2),
            _ => Err(ChannelMapError::UnknownRevision(s.to_string())),
        }
    }
}

/// Resolve `pin` for the revision named by `revision`.
pub fn resolve(pin: i64, revision: &str) -> Result<Channel, ChannelMapError> {
    revision.parse::<HardwareRevision>()?.resolve(pin)
}
