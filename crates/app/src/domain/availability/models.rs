//! Availability Models

use atelier::availability::DaySnapshot;
use jiff::{Timestamp, civil::Date};

use crate::uuids::TypedUuid;

/// Available Day UUID
pub type AvailableDayUuid = TypedUuid<AvailableDay>;

/// One availability-ledger row.
#[derive(Debug, Clone)]
pub struct AvailableDay {
    pub uuid: AvailableDayUuid,
    pub date: Date,
    pub normal_slots: u32,
    pub emergency_slots: u32,
    pub normal_booked: u32,
    pub emergency_booked: u32,
    /// Per-slot surcharge for emergency work on this day, minor units.
    pub emergency_surcharge: u64,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AvailableDay {
    /// The engine-facing copy of this row's capacity state.
    #[must_use]
    pub fn snapshot(&self) -> DaySnapshot {
        DaySnapshot {
            date: self.date,
            normal_slots: self.normal_slots,
            normal_booked: self.normal_booked,
            emergency_slots: self.emergency_slots,
            emergency_booked: self.emergency_booked,
            emergency_surcharge: self.emergency_surcharge,
            is_available: self.is_available,
        }
    }
}

/// Capacity settings applied to a day by the administrative surface.
///
/// Booked counters are never part of an edit; they only move through the
/// booking commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCapacity {
    pub normal_slots: u32,
    pub emergency_slots: u32,
    pub emergency_surcharge: u64,
    pub is_available: bool,
}
