//! Allocation planner
//!
//! Greedily spreads a requested quantity across an ordered list of candidate
//! days, consuming one slot class only. The walk is date-order-sensitive: the
//! primary date is drained first, then each additional date in selection
//! order. Entries always sum to the allocated quantity; when the days cannot
//! cover the request the plan says exactly how many slots are missing rather
//! than silently under-allocating.

use smallvec::SmallVec;

use crate::availability::{DaySnapshot, SlotClass};

/// Slots taken from a single day by one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationEntry {
    /// The day the slots come from.
    pub date: jiff::civil::Date,
    /// Slots of the plan's class consumed on that day.
    pub used: u32,
    /// That day's per-slot emergency surcharge, frozen at plan time.
    pub emergency_surcharge: u64,
}

/// Whether a plan covered the full requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Every requested slot was assigned to a day.
    Complete,
    /// The candidate days ran out; `missing` slots could not be placed.
    Short {
        /// Slots still needed after every candidate day was drained.
        missing: u32,
    },
}

/// The result of planning one cart item's quantity across its dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Slot class the whole plan consumes; never mixed within one item.
    pub class: SlotClass,
    /// Per-day assignments, in candidate-date order, zero-use days omitted.
    pub entries: SmallVec<[AllocationEntry; 4]>,
    /// Total slots assigned across all entries.
    pub allocated: u32,
    /// Completeness verdict.
    pub outcome: PlanOutcome,
}

impl AllocationPlan {
    /// Normal slots consumed by this plan.
    #[must_use]
    pub const fn normal_total(&self) -> u32 {
        match self.class {
            SlotClass::Normal => self.allocated,
            SlotClass::Emergency => 0,
        }
    }

    /// Emergency slots consumed by this plan.
    #[must_use]
    pub const fn emergency_total(&self) -> u32 {
        match self.class {
            SlotClass::Normal => 0,
            SlotClass::Emergency => self.allocated,
        }
    }

    /// True when every requested slot found a day.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.outcome, PlanOutcome::Complete)
    }
}

/// Plan `quantity` slots of `class` across `days`, greedily and in order.
///
/// Days with no remaining capacity (including administratively disabled
/// days) are skipped; they contribute no entry. The same ledger state and
/// arguments always produce the same plan.
#[must_use]
pub fn plan(quantity: u32, days: &[DaySnapshot], class: SlotClass) -> AllocationPlan {
    let mut entries = SmallVec::new();
    let mut remaining = quantity;

    for day in days {
        if remaining == 0 {
            break;
        }

        let used = remaining.min(day.remaining(class));

        if used == 0 {
            continue;
        }

        entries.push(AllocationEntry {
            date: day.date,
            used,
            emergency_surcharge: day.emergency_surcharge,
        });

        remaining -= used;
    }

    let outcome = if remaining == 0 {
        PlanOutcome::Complete
    } else {
        PlanOutcome::Short { missing: remaining }
    };

    AllocationPlan {
        class,
        entries,
        allocated: quantity - remaining,
        outcome,
    }
}
