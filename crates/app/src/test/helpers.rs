//! Test Helpers

use atelier::availability::SlotClass;
use atelier::pricing::Discount;
use jiff::civil::Date;

use crate::{
    domain::{
        availability::{
            AvailabilityService, AvailabilityServiceError,
            models::{AvailableDay, DayCapacity},
        },
        carts::{
            CartsService, CartsServiceError,
            models::{CartItem, CartItemUuid, DeliveryAddress, FabricChoice, NewCartItem},
        },
        products::{
            ProductsService, ProductsServiceError,
            models::{MaterialUuid, NewMaterial, NewProduct, ProductUuid},
        },
    },
    test::TestContext,
};

/// A bookable day with the given capacities and no surcharge.
pub(crate) async fn bookable_day(
    ctx: &TestContext,
    date: Date,
    normal_slots: u32,
    emergency_slots: u32,
) -> Result<AvailableDay, AvailabilityServiceError> {
    ctx.availability
        .set_day(
            date,
            DayCapacity {
                normal_slots,
                emergency_slots,
                emergency_surcharge: 0,
                is_available: true,
            },
        )
        .await
}

/// A day offering only emergency slots at the given surcharge.
pub(crate) async fn emergency_day(
    ctx: &TestContext,
    date: Date,
    emergency_slots: u32,
    emergency_surcharge: u64,
) -> Result<AvailableDay, AvailabilityServiceError> {
    ctx.availability
        .set_day(
            date,
            DayCapacity {
                normal_slots: 0,
                emergency_slots,
                emergency_surcharge,
                is_available: true,
            },
        )
        .await
}

pub(crate) async fn product(
    ctx: &TestContext,
    base_price: u64,
    fabric_discount: Option<Discount>,
) -> Result<ProductUuid, ProductsServiceError> {
    let created = ctx
        .products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            base_price,
            fabric_discount,
            materials: Vec::new(),
        })
        .await?;

    Ok(created.uuid)
}

pub(crate) async fn product_with_material(
    ctx: &TestContext,
    base_price: u64,
    extra_cost: u64,
) -> Result<(ProductUuid, MaterialUuid), ProductsServiceError> {
    let material_uuid = MaterialUuid::new();

    let created = ctx
        .products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            base_price,
            fabric_discount: None,
            materials: vec![NewMaterial {
                uuid: material_uuid,
                name: "customer fabric".to_string(),
                extra_cost,
            }],
        })
        .await?;

    Ok((created.uuid, material_uuid))
}

/// Add a shop-fabric, normal-class item for the context's customer.
pub(crate) async fn add_normal_item(
    ctx: &TestContext,
    product: ProductUuid,
    quantity: u32,
    selected_dates: Vec<Date>,
) -> Result<CartItem, CartsServiceError> {
    ctx.carts
        .add_item(
            ctx.customer_uuid,
            NewCartItem {
                uuid: CartItemUuid::new(),
                product_uuid: product,
                quantity,
                slot_class: SlotClass::Normal,
                selected_dates,
                fabric: FabricChoice::ShopFabric,
            },
        )
        .await
}

pub(crate) fn delivery_address() -> DeliveryAddress {
    DeliveryAddress {
        name: "A. Customer".to_string(),
        line1: "12 Tailor Row".to_string(),
        line2: None,
        city: "Pune".to_string(),
        postal_code: "411001".to_string(),
        phone: "+91 98765 43210".to_string(),
    }
}
