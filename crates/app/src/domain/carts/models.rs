//! Cart Models

use atelier::availability::SlotClass;
use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        CustomerUuid,
        products::models::{MaterialUuid, ProductUuid},
    },
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItem>;

/// Cart Model
#[derive(Debug, Clone)]
pub struct Cart {
    pub uuid: CartUuid,
    pub customer_uuid: CustomerUuid,
    pub delivery_address: Option<DeliveryAddress>,
    pub items: Vec<CartItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Where a finished order should be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

/// CartItem Model
///
/// The stored totals and costs are the planner's output at add time; the
/// checkout re-plans against fresh ledger rows before freezing anything.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub uuid: CartItemUuid,
    pub cart_uuid: CartUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    /// The one slot class this item consumes; never mixed.
    pub slot_class: SlotClass,
    /// Ordered selection; index 0 is the primary date.
    pub selected_dates: Vec<Date>,
    pub unit_price: u64,
    pub normal_slots_total: u32,
    pub emergency_slots_total: u32,
    pub normal_slots_cost: u64,
    pub emergency_slots_cost: u64,
    pub emergency_charges: u64,
    pub total_price: u64,
    pub created_at: Timestamp,
}

/// Which fabric the item is made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricChoice {
    /// The customer supplies their own fabric of the given material.
    CustomerFabric { material: MaterialUuid },
    /// The shop supplies the fabric.
    ShopFabric,
}

/// New Cart Item Model
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub slot_class: SlotClass,
    pub selected_dates: Vec<Date>,
    pub fabric: FabricChoice,
}
