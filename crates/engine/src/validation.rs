//! Capacity validation gate
//!
//! Before anything is made durable, the demand an operation places on each
//! day is aggregated and checked against the ledger's current remaining
//! capacity. The gate serves two scopes with the same code: a single
//! add-to-cart (one item's plan) and a whole-cart checkout, where demand for
//! the same day must be summed across every item before comparing.
//!
//! A day that has disappeared or been switched off fails distinctly from a
//! day that is merely short, so callers can tell the customer why.

use rustc_hash::FxHashMap;
use thiserror::Error;

use jiff::civil::Date;

use crate::allocation::AllocationPlan;
use crate::availability::{DaySnapshot, SlotClass};

/// Slots required from one day, per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotDemand {
    /// Normal slots required.
    pub normal: u32,
    /// Emergency slots required.
    pub emergency: u32,
}

impl SlotDemand {
    /// Demand for the given class.
    #[must_use]
    pub const fn of(&self, class: SlotClass) -> u32 {
        match class {
            SlotClass::Normal => self.normal,
            SlotClass::Emergency => self.emergency,
        }
    }
}

/// Aggregate per-day demand across one or more allocation plans.
#[derive(Debug, Clone, Default)]
pub struct Demand {
    by_date: FxHashMap<Date, SlotDemand>,
}

impl Demand {
    /// Empty demand.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` slots of `class` on `date`.
    pub fn add(&mut self, date: Date, class: SlotClass, count: u32) {
        let entry = self.by_date.entry(date).or_default();

        match class {
            SlotClass::Normal => entry.normal += count,
            SlotClass::Emergency => entry.emergency += count,
        }
    }

    /// Fold a whole plan's entries into the aggregate.
    pub fn add_plan(&mut self, plan: &AllocationPlan) {
        for entry in &plan.entries {
            self.add(entry.date, plan.class, entry.used);
        }
    }

    /// True when nothing is demanded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Demanded dates in calendar order.
    ///
    /// Sorted so that validation failures are deterministic when several
    /// days are short at once.
    #[must_use]
    pub fn dates(&self) -> Vec<Date> {
        let mut dates: Vec<Date> = self.by_date.keys().copied().collect();
        dates.sort_unstable();
        dates
    }

    /// Demand on a single date.
    #[must_use]
    pub fn on(&self, date: Date) -> SlotDemand {
        self.by_date.get(&date).copied().unwrap_or_default()
    }
}

/// Why an operation's demand cannot be satisfied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The day no longer exists in the ledger or was switched off after the
    /// dates were offered.
    #[error("{date} is no longer available for booking")]
    DayUnavailable {
        /// The day that went away.
        date: Date,
    },

    /// The day exists but cannot cover the aggregated demand.
    #[error(
        "{date} has {available} {class} slot(s) remaining but {required} are required"
    )]
    Shortfall {
        /// The day that is short.
        date: Date,
        /// Slot class the shortfall is in.
        class: SlotClass,
        /// Remaining capacity at validation time.
        available: u32,
        /// Aggregated demand on the day.
        required: u32,
    },
}

/// Check aggregated demand against current ledger snapshots.
///
/// `days` must contain the current row for every demanded date; a missing or
/// switched-off day fails with [`ValidationError::DayUnavailable`]. Each
/// date is checked for both classes; the first failing date (in calendar
/// order) is reported with exact counts.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, or `Ok(())` when every
/// demanded day can cover its aggregate demand.
pub fn validate(
    demand: &Demand,
    days: &FxHashMap<Date, DaySnapshot>,
) -> Result<(), ValidationError> {
    for date in demand.dates() {
        let required = demand.on(date);

        let Some(day) = days.get(&date) else {
            return Err(ValidationError::DayUnavailable { date });
        };

        if !day.is_available {
            return Err(ValidationError::DayUnavailable { date });
        }

        for class in [SlotClass::Normal, SlotClass::Emergency] {
            let available = day.remaining(class);
            let required = required.of(class);

            if required > available {
                return Err(ValidationError::Shortfall {
                    date,
                    class,
                    available,
                    required,
                });
            }
        }
    }

    Ok(())
}
