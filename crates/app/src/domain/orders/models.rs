//! Order Models

use std::{fmt, str::FromStr};

use atelier::availability::SlotClass;
use jiff::{Timestamp, civil::Date};
use thiserror::Error;

use crate::{
    domain::{
        CustomerUuid,
        availability::models::AvailableDayUuid,
        carts::models::DeliveryAddress,
        products::models::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Fulfilment status. Moves independently of [`PaymentStatus`]:
/// `pending -> confirmed -> in_progress -> completed`, or `cancelled`;
/// `needs_compensation` marks a paid order whose booking commit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NeedsCompensation,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NeedsCompensation => "needs_compensation",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a status from its stored form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status")]
pub struct ParseStatusError;

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "needs_compensation" => Ok(Self::NeedsCompensation),
            _ => Err(ParseStatusError),
        }
    }
}

/// Payment status: `pending -> completed`, or `failed`. The transition to
/// `completed` happens exactly once per order and gates the booking commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseStatusError),
        }
    }
}

/// Order Model
#[derive(Debug, Clone)]
pub struct Order {
    pub uuid: OrderUuid,
    pub customer_uuid: CustomerUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub slot_class: SlotClass,
    pub unit_price: u64,
    pub normal_slots_total: u32,
    pub emergency_slots_total: u32,
    pub normal_slots_cost: u64,
    pub emergency_slots_cost: u64,
    pub emergency_charges: u64,
    /// This order's share of the combined gateway charge, minor units.
    pub amount: u64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub delivery_address: DeliveryAddress,
    /// Frozen at checkout; the booking commit applies these counts, not a
    /// fresh plan.
    pub allocations: Vec<SlotAllocation>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One frozen allocation entry: the ledger row as it looked at checkout and
/// the slots this order takes from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAllocation {
    pub day_uuid: AvailableDayUuid,
    pub date: Date,
    pub normal_slots: u32,
    pub emergency_slots: u32,
    pub normal_booked: u32,
    pub emergency_booked: u32,
    pub normal_used: u32,
    pub emergency_used: u32,
    pub emergency_surcharge: u64,
}

impl SlotAllocation {
    /// Total slots this order takes from the day.
    #[must_use]
    pub const fn total_used(&self) -> u32 {
        self.normal_used + self.emergency_used
    }
}

/// The result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSummary {
    /// One order per cart item, in cart order.
    pub order_uuids: Vec<OrderUuid>,
    /// The combined gateway payment order covering every order.
    pub gateway_order_id: String,
    /// Total charged, minor units.
    pub amount: u64,
}

/// A payment confirmation delivered by the gateway.
#[derive(Debug, Clone)]
pub struct PaymentNotice {
    pub order_uuids: Vec<OrderUuid>,
    pub gateway_order_id: String,
    pub payment_id: String,
    /// Hex HMAC-SHA256 over `"{gateway_order_id}|{payment_id}"`.
    pub signature: String,
}
