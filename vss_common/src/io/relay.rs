//! Relay model.
//!
//! Each pressure gauge drives one relay contact wired to a fixed slot
//! `A`–`F`. A contact reads high while pressure is within limits; a falling
//! edge is a trip.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use super::channel_map::Channel;

// ─── RelaySlot ──────────────────────────────────────────────────────

/// Fixed relay slot on the interface board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelaySlot {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl RelaySlot {
    /// All slots in board order.
    pub const ALL: [RelaySlot; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];

    /// Section key used in the configuration file.
    pub const fn key(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

impl fmt::Display for RelaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RelaySlot {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            _ => Err(format!("unknown relay slot: {s:?}, expected A-F")),
        }
    }
}

// ─── TripAction ─────────────────────────────────────────────────────

/// Reaction to a relay trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripAction {
    /// Cut power to every shutdown switch.
    Shutdown,
    /// Assert the indicator and send a warning.
    Warn,
}

// ─── RelayConfig ────────────────────────────────────────────────────

/// One resolved relay. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub slot: RelaySlot,
    /// Display name used in alert texts.
    pub name: String,
    pub channel: Channel,
    pub warn_on_trip: bool,
    pub shutdown_on_trip: bool,
    pub active: bool,
}

impl RelayConfig {
    /// Handlers to register for a falling edge, in execution order.
    ///
    /// `Shutdown` always precedes `Warn` so power is cut before any
    /// notification is attempted.
    pub fn trip_actions(&self) -> Vec<TripAction> {
        let mut actions = Vec::with_capacity(2);
        if self.shutdown_on_trip {
            actions.push(TripAction::Shutdown);
        }
        if self.warn_on_trip {
            actions.push(TripAction::Warn);
        }
        actions
    }
}
