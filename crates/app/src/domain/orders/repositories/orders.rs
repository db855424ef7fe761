//! Orders Repository

use std::str::FromStr;

use atelier::availability::SlotClass;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::availability::repository::{
    try_get_amount, try_get_count, try_into_db_amount, try_into_db_count,
};
use crate::domain::carts::models::DeliveryAddress;
use crate::domain::orders::models::{Order, OrderStatus, OrderUuid, PaymentStatus};
use crate::domain::products::models::ProductUuid;
use crate::domain::CustomerUuid;

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LIST_ORDERS_BY_CUSTOMER_SQL: &str = include_str!("../sql/list_orders_by_customer.sql");
const SET_GATEWAY_ORDER_SQL: &str = include_str!("../sql/set_gateway_order.sql");
const COMPLETE_PAYMENT_SQL: &str = include_str!("../sql/complete_payment.sql");
const SET_STATUS_SQL: &str = include_str!("../sql/set_status.sql");
const FLAG_COMPENSATION_SQL: &str = include_str!("../sql/flag_compensation.sql");
const CANCEL_ORDERS_SQL: &str = include_str!("../sql/cancel_orders.sql");
const SWEEP_STALE_PENDING_SQL: &str = include_str!("../sql/sweep_stale_pending.sql");

/// Field set for one order row at creation time.
#[derive(Debug, Clone)]
pub(crate) struct NewOrder {
    pub(crate) uuid: OrderUuid,
    pub(crate) customer_uuid: CustomerUuid,
    pub(crate) product_uuid: ProductUuid,
    pub(crate) quantity: u32,
    pub(crate) slot_class: SlotClass,
    pub(crate) unit_price: u64,
    pub(crate) normal_slots_total: u32,
    pub(crate) emergency_slots_total: u32,
    pub(crate) normal_slots_cost: u64,
    pub(crate) emergency_slots_cost: u64,
    pub(crate) emergency_charges: u64,
    pub(crate) amount: u64,
    pub(crate) delivery_address: DeliveryAddress,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.customer_uuid.into_uuid())
            .bind(order.product_uuid.into_uuid())
            .bind(try_into_db_count(order.quantity, "quantity")?)
            .bind(order.slot_class.as_str())
            .bind(try_into_db_amount(order.unit_price, "unit_price")?)
            .bind(try_into_db_count(
                order.normal_slots_total,
                "normal_slots_total",
            )?)
            .bind(try_into_db_count(
                order.emergency_slots_total,
                "emergency_slots_total",
            )?)
            .bind(try_into_db_amount(
                order.normal_slots_cost,
                "normal_slots_cost",
            )?)
            .bind(try_into_db_amount(
                order.emergency_slots_cost,
                "emergency_slots_cost",
            )?)
            .bind(try_into_db_amount(
                order.emergency_charges,
                "emergency_charges",
            )?)
            .bind(try_into_db_amount(order.amount, "amount")?)
            .bind(&order.delivery_address.name)
            .bind(&order.delivery_address.line1)
            .bind(order.delivery_address.line2.as_deref())
            .bind(&order.delivery_address.city)
            .bind(&order.delivery_address.postal_code)
            .bind(&order.delivery_address.phone)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Option<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders_by_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<Order>, sqlx::Error> {
        query_as::<Postgres, Order>(LIST_ORDERS_BY_CUSTOMER_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn set_gateway_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        gateway_order_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_GATEWAY_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(gateway_order_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Atomically move `payment_status` from `pending` to `completed`.
    ///
    /// Returns zero rows when another delivery of the same confirmation got
    /// there first; callers must skip the ledger commit in that case.
    pub(crate) async fn complete_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        payment_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(COMPLETE_PAYMENT_SQL)
            .bind(order.into_uuid())
            .bind(payment_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn flag_compensation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        payment_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(FLAG_COMPENSATION_SQL)
            .bind(order.into_uuid())
            .bind(payment_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn cancel_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().map(|o| o.into_uuid()).collect();

        let rows_affected = query(CANCEL_ORDERS_SQL)
            .bind(&uuids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn sweep_stale_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        older_than: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SWEEP_STALE_PENDING_SQL)
            .bind(SqlxTimestamp::from(older_than))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let decode = |index: &str, source: Box<dyn std::error::Error + Send + Sync>| {
            sqlx::Error::ColumnDecode {
                index: index.to_string(),
                source,
            }
        };

        let slot_class: String = row.try_get("slot_class")?;
        let slot_class = SlotClass::from_str(&slot_class)
            .map_err(|e| decode("slot_class", Box::new(e)))?;

        let status: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&status).map_err(|e| decode("status", Box::new(e)))?;

        let payment_status: String = row.try_get("payment_status")?;
        let payment_status = PaymentStatus::from_str(&payment_status)
            .map_err(|e| decode("payment_status", Box::new(e)))?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            customer_uuid: CustomerUuid::from_uuid(row.try_get("customer_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_count(row, "quantity")?,
            slot_class,
            unit_price: try_get_amount(row, "unit_price")?,
            normal_slots_total: try_get_count(row, "normal_slots_total")?,
            emergency_slots_total: try_get_count(row, "emergency_slots_total")?,
            normal_slots_cost: try_get_amount(row, "normal_slots_cost")?,
            emergency_slots_cost: try_get_amount(row, "emergency_slots_cost")?,
            emergency_charges: try_get_amount(row, "emergency_charges")?,
            amount: try_get_amount(row, "amount")?,
            status,
            payment_status,
            gateway_order_id: row.try_get("gateway_order_id")?,
            payment_id: row.try_get("payment_id")?,
            delivery_address: DeliveryAddress {
                name: row.try_get("delivery_name")?,
                line1: row.try_get("delivery_line1")?,
                line2: row.try_get("delivery_line2")?,
                city: row.try_get("delivery_city")?,
                postal_code: row.try_get("delivery_postal_code")?,
                phone: row.try_get("delivery_phone")?,
            },
            allocations: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
