//! End-to-end engine scenarios: plan, price and validate together, the way
//! the application crate drives them.

use jiff::civil::date;
use rustc_hash::FxHashMap;
use testresult::TestResult;

use atelier::allocation::{PlanOutcome, plan};
use atelier::availability::SlotClass;
use atelier::fixtures;
use atelier::pricing::{Discount, FabricSource, price, unit_price};
use atelier::validation::{Demand, ValidationError, validate};

#[test]
fn partially_booked_day_reports_exact_missing_count() {
    // Day with 4 normal slots, 2 booked; a request for 3 gets 2 and is told
    // one more slot is needed.
    let days = [fixtures::day(2026, 9, 10, 4, 2)];

    let plan = plan(3, &days, SlotClass::Normal);

    assert_eq!(plan.allocated, 2);
    assert_eq!(plan.outcome, PlanOutcome::Short { missing: 1 });
}

#[test]
fn demand_spills_over_to_the_next_selected_date() {
    // 1 free slot on the primary date, 2 on the additional one; 3 requested.
    let days = [
        fixtures::day(2026, 9, 10, 3, 2),
        fixtures::day(2026, 9, 11, 2, 0),
    ];

    let plan = plan(3, &days, SlotClass::Normal);

    assert!(plan.is_complete());

    let spread: Vec<(jiff::civil::Date, u32)> =
        plan.entries.iter().map(|e| (e.date, e.used)).collect();

    assert_eq!(
        spread,
        vec![(date(2026, 9, 10), 1), (date(2026, 9, 11), 2)]
    );
}

#[test]
fn shop_fabric_discount_adjusts_the_unit_price() {
    // Base 100, shop provides the fabric, 10% discount -> unit price 90.
    let discount = Discount::from_wire(0.1);

    let adjusted = unit_price(100, FabricSource::ShopProvided { discount });

    assert_eq!(adjusted, 90);
}

#[test]
fn emergency_slots_cost_unit_price_plus_day_surcharge() {
    // 2 emergency slots on a day with a 20 surcharge at unit price 90:
    // 2 * (90 + 20) = 220.
    let days = [fixtures::day_with_emergency(2026, 9, 10, 4, 0, 20)];

    let plan = plan(2, &days, SlotClass::Emergency);
    let breakdown = price(&plan, 90);

    assert_eq!(breakdown.emergency_slots_cost, 220);
    assert_eq!(breakdown.total_price, 220);
}

#[test]
fn two_items_competing_for_the_last_slot_fail_checkout_validation() {
    // Both cart items need 1 normal slot on the same day, which has exactly
    // one remaining: individually plannable, jointly rejected.
    let days = [fixtures::day(2026, 9, 10, 5, 4)];
    let snapshots: FxHashMap<_, _> = days.iter().map(|d| (d.date, d.clone())).collect();

    let item_a = plan(1, &days, SlotClass::Normal);
    let item_b = plan(1, &days, SlotClass::Normal);

    assert!(item_a.is_complete());
    assert!(item_b.is_complete());

    let mut demand = Demand::new();
    demand.add_plan(&item_a);
    demand.add_plan(&item_b);

    assert_eq!(
        validate(&demand, &snapshots),
        Err(ValidationError::Shortfall {
            date: date(2026, 9, 10),
            class: SlotClass::Normal,
            available: 1,
            required: 2,
        })
    );
}

#[test]
fn full_item_flow_produces_a_consistent_breakdown() -> TestResult {
    let days = [
        fixtures::day(2026, 9, 10, 2, 0),
        fixtures::day(2026, 9, 11, 2, 0),
    ];
    let snapshots: FxHashMap<_, _> = days.iter().map(|d| (d.date, d.clone())).collect();

    let adjusted = unit_price(120, FabricSource::CustomerProvided { extra_cost: 30 });
    let plan = plan(4, &days, SlotClass::Normal);

    assert!(plan.is_complete());
    assert_eq!(plan.normal_total() + plan.emergency_total(), 4);

    let mut demand = Demand::new();
    demand.add_plan(&plan);
    validate(&demand, &snapshots)?;

    let breakdown = price(&plan, adjusted);

    assert_eq!(breakdown.unit_price, 150);
    assert_eq!(breakdown.total_price, 600);

    Ok(())
}
