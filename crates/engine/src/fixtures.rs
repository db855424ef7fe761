//! Test fixtures
//!
//! Day-snapshot builders shared by this crate's tests and by downstream
//! integration tests.

use jiff::civil::date;

use crate::availability::DaySnapshot;

/// A bookable day with the given normal capacity and booked count.
///
/// Emergency capacity defaults to zero; use [`day_with_emergency`] when the
/// test needs emergency slots.
#[must_use]
pub fn day(year: i16, month: i8, day: i8, normal_slots: u32, normal_booked: u32) -> DaySnapshot {
    DaySnapshot {
        date: date(year, month, day),
        normal_slots,
        normal_booked,
        emergency_slots: 0,
        emergency_booked: 0,
        emergency_surcharge: 0,
        is_available: true,
    }
}

/// A bookable day with the given emergency capacity, booked count and
/// per-slot surcharge, and no normal capacity.
#[must_use]
pub fn day_with_emergency(
    year: i16,
    month: i8,
    day: i8,
    emergency_slots: u32,
    emergency_booked: u32,
    emergency_surcharge: u64,
) -> DaySnapshot {
    DaySnapshot {
        date: date(year, month, day),
        normal_slots: 0,
        normal_booked: 0,
        emergency_slots,
        emergency_booked,
        emergency_surcharge,
        is_available: true,
    }
}
