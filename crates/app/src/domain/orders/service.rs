//! Orders service: checkout orchestration and the booking commit.
//!
//! Checkout runs the validation gate over the whole cart and freezes one
//! order per item inside a single transaction, so a rejected cart persists
//! nothing. The booking commit runs only after the gateway's signature
//! verifies, is gated by the order's one-shot payment transition, and goes
//! through the ledger's guarded increment — the last line of defense against
//! overselling a day.

use std::sync::Arc;

use async_trait::async_trait;
use atelier::{
    allocation::{self, AllocationPlan, PlanOutcome},
    availability::{DaySnapshot, SlotClass},
    pricing,
    validation::{Demand, validate},
};
use jiff::{Timestamp, civil::Date};
use mockall::automock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use sqlx::{Postgres, Transaction};
use tracing::{error, info, warn};

use crate::{
    database::Db,
    domain::{
        CustomerUuid,
        availability::{models::AvailableDay, repository::PgAvailabilityRepository},
        carts::{
            models::{CartItem, CartUuid},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        orders::{
            errors::OrdersServiceError,
            models::{
                CheckoutSummary, Order, OrderStatus, OrderUuid, PaymentNotice, SlotAllocation,
            },
            repositories::{NewOrder, PgAllocationsRepository, PgOrdersRepository},
        },
    },
    notifications::NotificationsService,
    payments::{PaymentGateway, PaymentSignatureKey},
};

/// A cart's items with their fresh per-item plans and the ledger rows that
/// backed them, as produced by the validation gate.
struct CartPlan {
    items: Vec<CartItem>,
    plans: Vec<AllocationPlan>,
    days: FxHashMap<Date, AvailableDay>,
}

#[derive(Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    allocations_repository: PgAllocationsRepository,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
    availability_repository: PgAvailabilityRepository,
    gateway: Arc<dyn PaymentGateway>,
    signature_key: PaymentSignatureKey,
    notifications: Arc<dyn NotificationsService>,
    currency: String,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(
        db: Db,
        gateway: Arc<dyn PaymentGateway>,
        signature_key: PaymentSignatureKey,
        notifications: Arc<dyn NotificationsService>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            allocations_repository: PgAllocationsRepository::new(),
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
            availability_repository: PgAvailabilityRepository::new(),
            gateway,
            signature_key,
            notifications,
            currency: currency.into(),
        }
    }

    /// Apply one order's frozen allocation to the ledger, gated by the
    /// one-shot payment transition. Returns the resulting status.
    async fn commit_booking(
        &self,
        order: OrderUuid,
        payment_id: &str,
    ) -> Result<OrderStatus, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let claimed = self
            .orders_repository
            .complete_payment(&mut tx, order, payment_id)
            .await?;

        if claimed == 0 {
            // A duplicate delivery lost the payment-status race; the first
            // one already applied the allocation.
            info!(order = %order, "payment already processed; skipping booking commit");

            let current = self
                .orders_repository
                .get_order(&mut tx, order)
                .await?
                .ok_or(OrdersServiceError::NotFound)?;

            return Ok(current.status);
        }

        let allocations = self
            .allocations_repository
            .get_allocations(&mut tx, order)
            .await?;

        for allocation in &allocations {
            let applied = self
                .availability_repository
                .increment_booked(
                    &mut tx,
                    allocation.day_uuid,
                    allocation.normal_used,
                    allocation.emergency_used,
                )
                .await?;

            if applied == 0 {
                // Rejected increment: the day vanished or a concurrent
                // checkout won the remaining capacity. Roll everything back
                // and flag the paid order for manual compensation.
                drop(tx);

                error!(
                    order = %order,
                    date = %allocation.date,
                    "booking commit refused; order flagged for compensation"
                );

                let mut tx = self.db.begin().await?;

                self.orders_repository
                    .flag_compensation(&mut tx, order, payment_id)
                    .await?;

                tx.commit().await?;

                return Ok(OrderStatus::NeedsCompensation);
            }
        }

        self.orders_repository
            .set_status(&mut tx, order, OrderStatus::Confirmed)
            .await?;

        tx.commit().await?;

        info!(order = %order, "booking committed");

        Ok(OrderStatus::Confirmed)
    }

    /// Run the capacity validation gate over a whole cart: re-read the
    /// ledger row for every touched date, re-plan each item against those
    /// fresh snapshots, and check the summed per-day demand. Read-only; the
    /// caller decides whether anything gets frozen.
    async fn plan_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartPlan, OrdersServiceError> {
        let items = self.items_repository.get_cart_items(tx, cart).await?;

        if items.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        let mut days: FxHashMap<Date, AvailableDay> = FxHashMap::default();

        for item in &items {
            for date in &item.selected_dates {
                if !days.contains_key(date) {
                    let day = self
                        .availability_repository
                        .get_day(tx, *date)
                        .await?
                        .ok_or(OrdersServiceError::DayUnavailable { date: *date })?;

                    days.insert(*date, day);
                }
            }
        }

        let snapshots: FxHashMap<Date, DaySnapshot> =
            days.iter().map(|(date, day)| (*date, day.snapshot())).collect();

        let mut plans: Vec<AllocationPlan> = Vec::with_capacity(items.len());

        for item in &items {
            let mut ordered: SmallVec<[DaySnapshot; 4]> = SmallVec::new();

            for date in &item.selected_dates {
                let snapshot = snapshots
                    .get(date)
                    .ok_or(OrdersServiceError::DayUnavailable { date: *date })?;

                ordered.push(snapshot.clone());
            }

            let plan = allocation::plan(item.quantity, &ordered, item.slot_class);

            if let PlanOutcome::Short { missing } = plan.outcome {
                return Err(OrdersServiceError::InsufficientCapacity {
                    item: item.uuid,
                    missing,
                });
            }

            plans.push(plan);
        }

        // The gate sums demand across items before comparing; two items
        // aiming at the same day must fit together or the whole operation
        // fails.
        let mut demand = Demand::new();

        for plan in &plans {
            demand.add_plan(plan);
        }

        validate(&demand, &snapshots)?;

        Ok(CartPlan { items, plans, days })
    }

    async fn load_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut loaded = self
            .orders_repository
            .get_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        loaded.allocations = self
            .allocations_repository
            .get_allocations(&mut tx, order)
            .await?;

        tx.commit().await?;

        Ok(loaded)
    }

    async fn transition(
        &self,
        order: OrderUuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self
            .orders_repository
            .get_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        if current.status != from {
            return Err(OrdersServiceError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        self.orders_repository.set_status(&mut tx, order, to).await?;

        tx.commit().await?;

        self.load_order(order).await
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn validate_cart(&self, customer: CustomerUuid) -> Result<(), OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_cart_by_customer(&mut tx, customer)
            .await?
            .ok_or(OrdersServiceError::EmptyCart)?;

        self.plan_cart(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn checkout(
        &self,
        customer: CustomerUuid,
    ) -> Result<CheckoutSummary, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_cart_by_customer(&mut tx, customer)
            .await?
            .ok_or(OrdersServiceError::EmptyCart)?;

        let address = cart
            .delivery_address
            .ok_or(OrdersServiceError::MissingDeliveryAddress)?;

        // Fresh ledger rows and plans; the add-to-cart reads are
        // deliberately not reused. A gate rejection leaves the transaction
        // unused, so nothing persists.
        let CartPlan { items, plans, days } = self.plan_cart(&mut tx, cart.uuid).await?;

        let mut order_uuids: Vec<OrderUuid> = Vec::with_capacity(items.len());
        let mut total: u64 = 0;

        for (item, plan) in items.iter().zip(&plans) {
            let breakdown = pricing::price(plan, item.unit_price);

            let order = self
                .orders_repository
                .create_order(
                    &mut tx,
                    &NewOrder {
                        uuid: OrderUuid::new(),
                        customer_uuid: customer,
                        product_uuid: item.product_uuid,
                        quantity: item.quantity,
                        slot_class: item.slot_class,
                        unit_price: item.unit_price,
                        normal_slots_total: plan.normal_total(),
                        emergency_slots_total: plan.emergency_total(),
                        normal_slots_cost: breakdown.normal_slots_cost,
                        emergency_slots_cost: breakdown.emergency_slots_cost,
                        emergency_charges: breakdown.emergency_charges,
                        amount: breakdown.total_price,
                        delivery_address: address.clone(),
                    },
                )
                .await?;

            let mut position: u32 = 0;

            for entry in &plan.entries {
                let day = days
                    .get(&entry.date)
                    .ok_or(OrdersServiceError::DayUnavailable { date: entry.date })?;

                let (normal_used, emergency_used) = match plan.class {
                    SlotClass::Normal => (entry.used, 0),
                    SlotClass::Emergency => (0, entry.used),
                };

                self.allocations_repository
                    .create_allocation(
                        &mut tx,
                        order.uuid,
                        position,
                        &SlotAllocation {
                            day_uuid: day.uuid,
                            date: entry.date,
                            normal_slots: day.normal_slots,
                            emergency_slots: day.emergency_slots,
                            normal_booked: day.normal_booked,
                            emergency_booked: day.emergency_booked,
                            normal_used,
                            emergency_used,
                            emergency_surcharge: entry.emergency_surcharge,
                        },
                    )
                    .await?;

                position += 1;
            }

            total += breakdown.total_price;
            order_uuids.push(order.uuid);
        }

        // One transaction for the whole batch: every sibling order persists
        // or none does.
        tx.commit().await?;

        info!(
            customer = %customer,
            orders = order_uuids.len(),
            amount = total,
            "checkout validated; orders frozen"
        );

        let gateway_order = self
            .gateway
            .create_order(total, &self.currency, &cart.uuid.to_string())
            .await?;

        let mut tx = self.db.begin().await?;

        for order in &order_uuids {
            self.orders_repository
                .set_gateway_order(&mut tx, *order, &gateway_order.id)
                .await?;
        }

        tx.commit().await?;

        Ok(CheckoutSummary {
            order_uuids,
            gateway_order_id: gateway_order.id,
            amount: total,
        })
    }

    async fn verify_payment(
        &self,
        notice: PaymentNotice,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        if !self.signature_key.verify(
            &notice.gateway_order_id,
            &notice.payment_id,
            &notice.signature,
        ) {
            warn!(
                gateway_order = %notice.gateway_order_id,
                payment = %notice.payment_id,
                "payment signature mismatch; cancelling orders"
            );

            let mut tx = self.db.begin().await?;

            self.orders_repository
                .cancel_orders(&mut tx, &notice.order_uuids)
                .await?;

            tx.commit().await?;

            return Err(OrdersServiceError::SignatureMismatch);
        }

        let mut customer = None;

        for &order in &notice.order_uuids {
            let loaded = self.load_order(order).await;

            let Ok(loaded) = loaded else {
                warn!(order = %order, "payment notice references an unknown order");
                continue;
            };

            customer = Some(loaded.customer_uuid);

            self.commit_booking(order, &notice.payment_id).await?;
        }

        // The cart has served its purpose once payment lands.
        if let Some(customer) = customer {
            let mut tx = self.db.begin().await?;

            if let Some(cart) = self
                .carts_repository
                .get_cart_by_customer(&mut tx, customer)
                .await?
            {
                self.carts_repository.delete_cart(&mut tx, cart.uuid).await?;
            }

            tx.commit().await?;
        }

        let mut results = Vec::with_capacity(notice.order_uuids.len());

        for &order in &notice.order_uuids {
            if let Ok(order) = self.load_order(order).await {
                results.push(order);
            }
        }

        let confirmed: Vec<Order> = results
            .iter()
            .filter(|o| o.status == OrderStatus::Confirmed)
            .cloned()
            .collect();

        if let Some(customer) = customer
            && !confirmed.is_empty()
            && let Err(error) = self.notifications.order_confirmed(customer, &confirmed).await
        {
            // Best-effort by contract; the booking stands regardless.
            warn!(%error, "order confirmation notification failed");
        }

        Ok(results)
    }

    async fn cancel_on_failure(
        &self,
        order_uuids: Vec<OrderUuid>,
        reason: String,
    ) -> Result<u64, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let cancelled = self
            .orders_repository
            .cancel_orders(&mut tx, &order_uuids)
            .await?;

        tx.commit().await?;

        info!(cancelled, reason = %reason, "orders cancelled without ledger effect");

        Ok(cancelled)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        self.load_order(order).await
    }

    async fn list_orders(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let orders = self
            .orders_repository
            .list_orders_by_customer(&mut tx, customer)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn mark_in_progress(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        self.transition(order, OrderStatus::Confirmed, OrderStatus::InProgress)
            .await
    }

    async fn mark_completed(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        self.transition(order, OrderStatus::InProgress, OrderStatus::Completed)
            .await
    }

    async fn sweep_stale_pending(
        &self,
        older_than: Timestamp,
    ) -> Result<u64, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let swept = self
            .orders_repository
            .sweep_stale_pending(&mut tx, older_than)
            .await?;

        tx.commit().await?;

        if swept > 0 {
            info!(swept, "stale pending orders cancelled");
        }

        Ok(swept)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Dry-run the capacity validation gate over the customer's whole cart:
    /// per-day demand summed across every item against freshly read ledger
    /// rows. Persists nothing.
    async fn validate_cart(&self, customer: CustomerUuid) -> Result<(), OrdersServiceError>;

    /// Validate the whole cart against fresh ledger rows and, on success,
    /// freeze one order per item (atomically) plus one combined gateway
    /// payment order.
    async fn checkout(&self, customer: CustomerUuid)
    -> Result<CheckoutSummary, OrdersServiceError>;

    /// Verify a gateway payment confirmation and commit the booking for
    /// every order in the batch. Safe to call more than once per order.
    async fn verify_payment(
        &self,
        notice: PaymentNotice,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    /// Cancel pending orders after a gateway failure or dismissal. Never
    /// touches the ledger.
    async fn cancel_on_failure(
        &self,
        order_uuids: Vec<OrderUuid>,
        reason: String,
    ) -> Result<u64, OrdersServiceError>;

    /// One order with its frozen allocation.
    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// A customer's orders, newest first, without allocations.
    async fn list_orders(&self, customer: CustomerUuid)
    -> Result<Vec<Order>, OrdersServiceError>;

    /// Administrative transition `confirmed -> in_progress`.
    async fn mark_in_progress(&self, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Administrative transition `in_progress -> completed`.
    async fn mark_completed(&self, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Cancel `pending` orders created before the cutoff whose payment never
    /// arrived. Returns how many were swept.
    async fn sweep_stale_pending(&self, older_than: Timestamp)
    -> Result<u64, OrdersServiceError>;
}
