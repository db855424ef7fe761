//! Availability snapshots
//!
//! A [`DaySnapshot`] is a point-in-time copy of one availability-ledger row:
//! capacity and booked counts for both slot classes, the per-day emergency
//! surcharge, and the administrative availability flag. All remaining-capacity
//! arithmetic lives here so the planner and the validation gate agree on it.

use std::{fmt, str::FromStr};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two classes of production slot a day offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotClass {
    /// Standard lead-time production.
    Normal,
    /// Rush production, carrying a per-day surcharge.
    Emergency,
}

impl SlotClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for SlotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a slot class from its wire form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown slot class")]
pub struct ParseSlotClassError;

impl FromStr for SlotClass {
    type Err = ParseSlotClassError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "normal" => Ok(Self::Normal),
            "emergency" => Ok(Self::Emergency),
            _ => Err(ParseSlotClassError),
        }
    }
}

/// Point-in-time copy of one availability-ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySnapshot {
    /// Calendar day, compared by date components only.
    pub date: Date,
    /// Total normal-slot capacity.
    pub normal_slots: u32,
    /// Normal slots already booked.
    pub normal_booked: u32,
    /// Total emergency-slot capacity.
    pub emergency_slots: u32,
    /// Emergency slots already booked.
    pub emergency_booked: u32,
    /// Surcharge added per emergency slot consumed on this day, minor units.
    pub emergency_surcharge: u64,
    /// Administrative override; when false the day books as full.
    pub is_available: bool,
}

impl DaySnapshot {
    /// Remaining capacity for the given slot class.
    ///
    /// A day switched off by the administrator reports zero remaining for
    /// booking purposes regardless of raw capacity. Booked counts above
    /// capacity (possible after an administrative capacity reduction) also
    /// report zero rather than wrapping.
    #[must_use]
    pub fn remaining(&self, class: SlotClass) -> u32 {
        if !self.is_available {
            return 0;
        }

        match class {
            SlotClass::Normal => self.normal_slots.saturating_sub(self.normal_booked),
            SlotClass::Emergency => self.emergency_slots.saturating_sub(self.emergency_booked),
        }
    }

    /// Remaining normal-slot capacity.
    #[must_use]
    pub fn remaining_normal(&self) -> u32 {
        self.remaining(SlotClass::Normal)
    }

    /// Remaining emergency-slot capacity.
    #[must_use]
    pub fn remaining_emergency(&self) -> u32 {
        self.remaining(SlotClass::Emergency)
    }
}
