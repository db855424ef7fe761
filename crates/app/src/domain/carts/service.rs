//! Carts service.

use async_trait::async_trait;
use atelier::{
    allocation,
    availability::DaySnapshot,
    pricing::{self, FabricSource},
    validation::{Demand, validate},
};
use mockall::automock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        CustomerUuid,
        availability::repository::PgAvailabilityRepository,
        carts::{
            errors::CartsServiceError,
            models::{Cart, CartItem, CartItemUuid, CartUuid, DeliveryAddress, FabricChoice, NewCartItem},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        products::repository::PgProductsRepository,
    },
};

/// Largest quantity a single cart item may carry.
pub const MAX_ITEM_QUANTITY: u32 = 10;

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
    products_repository: PgProductsRepository,
    availability_repository: PgAvailabilityRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
            availability_repository: PgAvailabilityRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, customer: CustomerUuid) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_cart_by_customer(&mut tx, customer)
            .await?;

        let Some(mut cart) = cart else {
            return Err(CartsServiceError::NotFound);
        };

        cart.items = self
            .items_repository
            .get_cart_items(&mut tx, cart.uuid)
            .await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn add_item(
        &self,
        customer: CustomerUuid,
        item: NewCartItem,
    ) -> Result<CartItem, CartsServiceError> {
        if item.quantity < 1 || item.quantity > MAX_ITEM_QUANTITY {
            return Err(CartsServiceError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        if item.selected_dates.is_empty() {
            return Err(CartsServiceError::NoDatesSelected);
        }

        for (index, date) in item.selected_dates.iter().enumerate() {
            if item.selected_dates.iter().skip(index + 1).any(|d| d == date) {
                return Err(CartsServiceError::DuplicateDate { date: *date });
            }
        }

        let mut tx = self.db.begin().await?;

        let cart = match self
            .carts_repository
            .get_cart_by_customer(&mut tx, customer)
            .await?
        {
            Some(cart) => cart,
            None => {
                self.carts_repository
                    .create_cart(&mut tx, CartUuid::new(), customer)
                    .await?
            }
        };

        let product = self
            .products_repository
            .get_product(&mut tx, item.product_uuid)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let fabric = match item.fabric {
            FabricChoice::CustomerFabric { material } => {
                let material = product
                    .material(material)
                    .ok_or(CartsServiceError::UnknownMaterial)?;

                FabricSource::CustomerProvided {
                    extra_cost: material.extra_cost,
                }
            }
            FabricChoice::ShopFabric => FabricSource::ShopProvided {
                discount: product.fabric_discount,
            },
        };

        let unit_price = pricing::unit_price(product.base_price, fabric);

        // Live ledger reads in the customer's date order; the planner walks
        // them primary-first.
        let mut snapshots: SmallVec<[DaySnapshot; 4]> = SmallVec::new();
        let mut by_date: FxHashMap<jiff::civil::Date, DaySnapshot> = FxHashMap::default();

        for date in &item.selected_dates {
            let day = self
                .availability_repository
                .get_day(&mut tx, *date)
                .await?
                .ok_or(CartsServiceError::DayUnavailable { date: *date })?;

            let snapshot = day.snapshot();
            by_date.insert(snapshot.date, snapshot.clone());
            snapshots.push(snapshot);
        }

        let plan = allocation::plan(item.quantity, &snapshots, item.slot_class);

        if let allocation::PlanOutcome::Short { missing } = plan.outcome {
            return Err(CartsServiceError::InsufficientCapacity { missing });
        }

        let mut demand = Demand::new();
        demand.add_plan(&plan);
        validate(&demand, &by_date)?;

        let breakdown = pricing::price(&plan, unit_price);

        let created = self
            .items_repository
            .create_cart_item(&mut tx, cart.uuid, &item, &plan, &breakdown)
            .await?;

        tx.commit().await?;

        info!(
            customer = %customer,
            item = %created.uuid,
            quantity = created.quantity,
            total_price = created.total_price,
            "cart item planned and added"
        );

        Ok(created)
    }

    async fn remove_item(
        &self,
        customer: CustomerUuid,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_cart_by_customer(&mut tx, customer)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let rows_affected = self
            .items_repository
            .delete_cart_item(&mut tx, cart.uuid, item)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn set_delivery_address(
        &self,
        customer: CustomerUuid,
        address: DeliveryAddress,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = match self
            .carts_repository
            .get_cart_by_customer(&mut tx, customer)
            .await?
        {
            Some(cart) => cart,
            None => {
                self.carts_repository
                    .create_cart(&mut tx, CartUuid::new(), customer)
                    .await?
            }
        };

        self.carts_repository
            .set_delivery_address(&mut tx, cart.uuid, &address)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn clear_cart(&self, customer: CustomerUuid) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_cart_by_customer(&mut tx, customer)
            .await?;

        if let Some(cart) = cart {
            self.carts_repository.delete_cart(&mut tx, cart.uuid).await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the customer's cart with its items.
    async fn get_cart(&self, customer: CustomerUuid) -> Result<Cart, CartsServiceError>;

    /// Plan, price and add one item to the customer's cart, creating the
    /// cart if this is the first add.
    async fn add_item(
        &self,
        customer: CustomerUuid,
        item: NewCartItem,
    ) -> Result<CartItem, CartsServiceError>;

    /// Remove one item whole; items are never partially edited.
    async fn remove_item(
        &self,
        customer: CustomerUuid,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError>;

    /// Set the cart's delivery address, creating the cart when necessary.
    async fn set_delivery_address(
        &self,
        customer: CustomerUuid,
        address: DeliveryAddress,
    ) -> Result<(), CartsServiceError>;

    /// Drop the customer's cart and everything in it.
    async fn clear_cart(&self, customer: CustomerUuid) -> Result<(), CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use atelier::availability::SlotClass;
    use atelier::pricing::Discount;
    use jiff::civil::date;
    use testresult::TestResult;

    use crate::{
        domain::availability::AvailabilityService,
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn add_item_plans_and_prices_with_shop_fabric_discount() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::bookable_day(&ctx, date(2026, 10, 1), 3, 0).await?;

        let product = helpers::product(
            &ctx,
            100_00,
            Some(Discount::PercentageOff { basis_points: 1000 }),
        )
        .await?;

        let item = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 2,
                    slot_class: SlotClass::Normal,
                    selected_dates: vec![date(2026, 10, 1)],
                    fabric: FabricChoice::ShopFabric,
                },
            )
            .await?;

        assert_eq!(item.unit_price, 90_00);
        assert_eq!(item.normal_slots_total, 2);
        assert_eq!(item.emergency_slots_total, 0);
        assert_eq!(item.normal_slots_cost, 180_00);
        assert_eq!(item.total_price, 180_00);
        assert_eq!(item.selected_dates, vec![date(2026, 10, 1)]);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_spreads_across_dates_in_selection_order() -> TestResult {
        let ctx = TestContext::new().await;

        // 1 slot free on the primary date, 2 on the additional one.
        let day_one = helpers::bookable_day(&ctx, date(2026, 10, 1), 1, 0).await?;
        helpers::bookable_day(&ctx, date(2026, 10, 2), 2, 0).await?;

        let product = helpers::product(&ctx, 50_00, None).await?;

        let item = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 3,
                    slot_class: SlotClass::Normal,
                    selected_dates: vec![day_one.date, date(2026, 10, 2)],
                    fabric: FabricChoice::ShopFabric,
                },
            )
            .await?;

        assert_eq!(item.normal_slots_total, 3);
        assert_eq!(item.selected_dates, vec![date(2026, 10, 1), date(2026, 10, 2)]);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_short_of_capacity_reports_missing_count() -> TestResult {
        let ctx = TestContext::new().await;

        // 4 slots, 2 already booked; asking for 3 leaves 1 missing.
        let day = helpers::bookable_day(&ctx, date(2026, 10, 1), 4, 0).await?;
        ctx.availability.increment_booked(day.uuid, 2, 0).await?;

        let product = helpers::product(&ctx, 50_00, None).await?;

        let result = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 3,
                    slot_class: SlotClass::Normal,
                    selected_dates: vec![date(2026, 10, 1)],
                    fabric: FabricChoice::ShopFabric,
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::InsufficientCapacity { missing: 1 })
            ),
            "expected InsufficientCapacity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_on_unknown_date_fails_as_unavailable() -> TestResult {
        let ctx = TestContext::new().await;

        let product = helpers::product(&ctx, 50_00, None).await?;

        let result = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 1,
                    slot_class: SlotClass::Normal,
                    selected_dates: vec![date(2026, 10, 1)],
                    fabric: FabricChoice::ShopFabric,
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::DayUnavailable { date: d }) if d == date(2026, 10, 1)
            ),
            "expected DayUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_rejects_out_of_range_quantity() -> TestResult {
        let ctx = TestContext::new().await;

        let product = helpers::product(&ctx, 50_00, None).await?;

        for quantity in [0, 11] {
            let result = ctx
                .carts
                .add_item(
                    ctx.customer_uuid,
                    NewCartItem {
                        uuid: CartItemUuid::new(),
                        product_uuid: product,
                        quantity,
                        slot_class: SlotClass::Normal,
                        selected_dates: vec![date(2026, 10, 1)],
                        fabric: FabricChoice::ShopFabric,
                    },
                )
                .await;

            assert!(
                matches!(result, Err(CartsServiceError::InvalidQuantity { .. })),
                "expected InvalidQuantity for {quantity}, got {result:?}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn add_item_rejects_duplicate_dates() -> TestResult {
        let ctx = TestContext::new().await;

        let product = helpers::product(&ctx, 50_00, None).await?;

        let result = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 2,
                    slot_class: SlotClass::Normal,
                    selected_dates: vec![date(2026, 10, 1), date(2026, 10, 1)],
                    fabric: FabricChoice::ShopFabric,
                },
            )
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::DuplicateDate { .. })),
            "expected DuplicateDate, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_with_customer_fabric_adds_material_cost() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::bookable_day(&ctx, date(2026, 10, 1), 3, 0).await?;

        let (product, material) = helpers::product_with_material(&ctx, 100_00, 15_00).await?;

        let item = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 1,
                    slot_class: SlotClass::Normal,
                    selected_dates: vec![date(2026, 10, 1)],
                    fabric: FabricChoice::CustomerFabric { material },
                },
            )
            .await?;

        assert_eq!(item.unit_price, 115_00);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_with_foreign_material_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::bookable_day(&ctx, date(2026, 10, 1), 3, 0).await?;

        let product = helpers::product(&ctx, 100_00, None).await?;

        let result = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 1,
                    slot_class: SlotClass::Normal,
                    selected_dates: vec![date(2026, 10, 1)],
                    fabric: FabricChoice::CustomerFabric {
                        material: crate::domain::products::models::MaterialUuid::new(),
                    },
                },
            )
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::UnknownMaterial)),
            "expected UnknownMaterial, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn emergency_item_is_priced_with_per_day_surcharge() -> TestResult {
        let ctx = TestContext::new().await;

        // 2 emergency slots at a 20.00 surcharge; unit price 90.00 after a
        // 10% shop-fabric discount on 100.00.
        helpers::emergency_day(&ctx, date(2026, 10, 1), 2, 20_00).await?;

        let product = helpers::product(
            &ctx,
            100_00,
            Some(Discount::PercentageOff { basis_points: 1000 }),
        )
        .await?;

        let item = ctx
            .carts
            .add_item(
                ctx.customer_uuid,
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity: 2,
                    slot_class: SlotClass::Emergency,
                    selected_dates: vec![date(2026, 10, 1)],
                    fabric: FabricChoice::ShopFabric,
                },
            )
            .await?;

        assert_eq!(item.emergency_slots_total, 2);
        assert_eq!(item.emergency_slots_cost, 220_00);
        assert_eq!(item.emergency_charges, 40_00);
        assert_eq!(item.total_price, 220_00);

        Ok(())
    }

    #[tokio::test]
    async fn removed_item_disappears_from_the_cart() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::bookable_day(&ctx, date(2026, 10, 1), 5, 0).await?;
        let product = helpers::product(&ctx, 50_00, None).await?;

        let item = helpers::add_normal_item(&ctx, product, 1, vec![date(2026, 10, 1)]).await?;
        helpers::add_normal_item(&ctx, product, 1, vec![date(2026, 10, 1)]).await?;

        ctx.carts.remove_item(ctx.customer_uuid, item.uuid).await?;

        let cart = ctx.carts.get_cart(ctx.customer_uuid).await?;

        assert_eq!(cart.items.len(), 1);
        assert!(!cart.items.iter().any(|i| i.uuid == item.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn get_cart_without_a_cart_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.carts.get_cart(ctx.customer_uuid).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn delivery_address_round_trips() -> TestResult {
        let ctx = TestContext::new().await;

        let address = helpers::delivery_address();

        ctx.carts
            .set_delivery_address(ctx.customer_uuid, address.clone())
            .await?;

        let cart = ctx.carts.get_cart(ctx.customer_uuid).await?;

        assert_eq!(cart.delivery_address, Some(address));

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_removes_cart_and_items() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::bookable_day(&ctx, date(2026, 10, 1), 5, 0).await?;
        let product = helpers::product(&ctx, 50_00, None).await?;
        helpers::add_normal_item(&ctx, product, 1, vec![date(2026, 10, 1)]).await?;

        ctx.carts.clear_cart(ctx.customer_uuid).await?;

        let result = ctx.carts.get_cart(ctx.customer_uuid).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound after clearing, got {result:?}"
        );

        Ok(())
    }
}
