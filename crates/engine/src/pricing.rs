//! Pricing
//!
//! Unit-price adjustment and the per-plan cost breakdown. The unit price is
//! the product's base price adjusted exactly once: a customer-supplied fabric
//! adds that material's handling cost, a shop-supplied fabric subtracts the
//! product's configured discount. Emergency slots additionally carry the
//! surcharge of the specific day they land on, so the same emergency quantity
//! can cost differently on different dates.
//!
//! All amounts are integer minor units.

use serde::{Deserialize, Serialize};

use crate::allocation::AllocationPlan;
use crate::availability::SlotClass;

/// Basis points in a whole (100%).
const BASIS_POINTS_SCALE: u64 = 10_000;

/// A discount applied when the shop supplies the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the base price, in basis points (1000 = 10%).
    PercentageOff {
        /// Discount size in basis points.
        basis_points: u32,
    },
    /// Flat amount off, in minor units.
    AmountOff {
        /// Discount size in minor units.
        amount: u64,
    },
}

impl Discount {
    /// Parse the storefront's wire number: values at or below 1 are a
    /// fraction of the base price, values above 1 a flat amount.
    ///
    /// Returns `None` for non-finite or negative input.
    #[must_use]
    pub fn from_wire(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }

        if value <= 1.0 {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "value is within 0.0..=1.0, the product fits u32"
            )]
            let basis_points = (value * 10_000.0).round() as u32;

            Some(Self::PercentageOff { basis_points })
        } else {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "value is finite and positive"
            )]
            let amount = value.round() as u64;

            Some(Self::AmountOff { amount })
        }
    }

    /// The amount this discount takes off the given base price.
    #[must_use]
    pub fn amount_off(&self, base_price: u64) -> u64 {
        match *self {
            Self::PercentageOff { basis_points } => {
                base_price * u64::from(basis_points) / BASIS_POINTS_SCALE
            }
            Self::AmountOff { amount } => amount,
        }
    }
}

/// Who supplies the fabric for an item, and the resulting price adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricSource {
    /// The customer brings their own fabric; the chosen material's handling
    /// cost is added to the base price.
    CustomerProvided {
        /// Per-unit handling cost of the chosen material, minor units.
        extra_cost: u64,
    },
    /// The shop supplies the fabric; the product's discount, if any, is
    /// subtracted from the base price.
    ShopProvided {
        /// The product's configured fabric discount.
        discount: Option<Discount>,
    },
}

/// Compute the adjusted per-slot price for an item.
///
/// The shop-provided discount saturates at zero; a discount larger than the
/// base price never produces a negative unit price.
#[must_use]
pub fn unit_price(base_price: u64, fabric: FabricSource) -> u64 {
    match fabric {
        FabricSource::CustomerProvided { extra_cost } => base_price + extra_cost,
        FabricSource::ShopProvided { discount } => discount
            .map_or(base_price, |d| {
                base_price.saturating_sub(d.amount_off(base_price))
            }),
    }
}

/// Cost breakdown for one allocation plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Adjusted per-slot price.
    pub unit_price: u64,
    /// `normal_total * unit_price`.
    pub normal_slots_cost: u64,
    /// Sum over emergency entries of `used * (unit_price + day surcharge)`.
    pub emergency_slots_cost: u64,
    /// Surcharge component alone: sum of `used * day surcharge`.
    pub emergency_charges: u64,
    /// `normal_slots_cost + emergency_slots_cost`.
    pub total_price: u64,
}

/// Price an allocation plan at the given unit price.
///
/// Pure arithmetic over the plan's frozen entries; calling it twice with the
/// same plan yields an identical breakdown.
#[must_use]
pub fn price(plan: &AllocationPlan, unit_price: u64) -> PriceBreakdown {
    let (emergency_slots_cost, emergency_charges) = match plan.class {
        SlotClass::Normal => (0, 0),
        SlotClass::Emergency => plan.entries.iter().fold((0, 0), |(cost, charges), entry| {
            let used = u64::from(entry.used);

            (
                cost + used * (unit_price + entry.emergency_surcharge),
                charges + used * entry.emergency_surcharge,
            )
        }),
    };

    let normal_slots_cost = u64::from(plan.normal_total()) * unit_price;

    PriceBreakdown {
        unit_price,
        normal_slots_cost,
        emergency_slots_cost,
        emergency_charges,
        total_price: normal_slots_cost + emergency_slots_cost,
    }
}
