//! Cart Items Repository

use std::str::FromStr;

use atelier::{allocation::AllocationPlan, availability::SlotClass, pricing::PriceBreakdown};
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::availability::repository::{
    try_get_amount, try_get_count, try_into_db_amount, try_into_db_count,
};
use crate::domain::carts::models::{CartItem, CartItemUuid, CartUuid, NewCartItem};
use crate::domain::products::models::ProductUuid;

const GET_CART_ITEMS_SQL: &str = include_str!("../sql/get_cart_items.sql");
const CREATE_CART_ITEM_SQL: &str = include_str!("../sql/create_cart_item.sql");
const CREATE_CART_ITEM_DATE_SQL: &str = include_str!("../sql/create_cart_item_date.sql");
const GET_CART_ITEM_DATES_SQL: &str = include_str!("../sql/get_cart_item_dates.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("../sql/delete_cart_item.sql");
const CLEAR_CART_ITEMS_SQL: &str = include_str!("../sql/clear_cart_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Fetch a cart's items with their ordered date selections.
    pub(crate) async fn get_cart_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        let mut items = query_as::<Postgres, CartItem>(GET_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        for item in &mut items {
            item.selected_dates = self.get_item_dates(tx, item.uuid).await?;
        }

        Ok(items)
    }

    pub(crate) async fn create_cart_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: &NewCartItem,
        plan: &AllocationPlan,
        breakdown: &PriceBreakdown,
    ) -> Result<CartItem, sqlx::Error> {
        let mut created = query_as::<Postgres, CartItem>(CREATE_CART_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(cart.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(try_into_db_count(item.quantity, "quantity")?)
            .bind(item.slot_class.as_str())
            .bind(try_into_db_amount(breakdown.unit_price, "unit_price")?)
            .bind(try_into_db_count(plan.normal_total(), "normal_slots_total")?)
            .bind(try_into_db_count(
                plan.emergency_total(),
                "emergency_slots_total",
            )?)
            .bind(try_into_db_amount(
                breakdown.normal_slots_cost,
                "normal_slots_cost",
            )?)
            .bind(try_into_db_amount(
                breakdown.emergency_slots_cost,
                "emergency_slots_cost",
            )?)
            .bind(try_into_db_amount(
                breakdown.emergency_charges,
                "emergency_charges",
            )?)
            .bind(try_into_db_amount(breakdown.total_price, "total_price")?)
            .fetch_one(&mut **tx)
            .await?;

        for (position, date) in item.selected_dates.iter().enumerate() {
            let position = i32::try_from(position).map_err(|e| sqlx::Error::ColumnDecode {
                index: "position".to_string(),
                source: Box::new(e),
            })?;

            query(CREATE_CART_ITEM_DATE_SQL)
                .bind(item.uuid.into_uuid())
                .bind(position)
                .bind(SqlxDate::from(*date))
                .execute(&mut **tx)
                .await?;
        }

        created.selected_dates = item.selected_dates.clone();

        Ok(created)
    }

    pub(crate) async fn delete_cart_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: CartItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn clear_cart_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_ITEMS_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn get_item_dates(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: CartItemUuid,
    ) -> Result<Vec<jiff::civil::Date>, sqlx::Error> {
        let dates: Vec<(SqlxDate,)> = query_as(GET_CART_ITEM_DATES_SQL)
            .bind(item.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(dates.into_iter().map(|(date,)| date.to_jiff()).collect())
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let slot_class: String = row.try_get("slot_class")?;

        let slot_class =
            SlotClass::from_str(&slot_class).map_err(|e| sqlx::Error::ColumnDecode {
                index: "slot_class".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: CartItemUuid::from_uuid(row.try_get("uuid")?),
            cart_uuid: CartUuid::from_uuid(row.try_get("cart_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_count(row, "quantity")?,
            slot_class,
            selected_dates: Vec::new(),
            unit_price: try_get_amount(row, "unit_price")?,
            normal_slots_total: try_get_count(row, "normal_slots_total")?,
            emergency_slots_total: try_get_count(row, "emergency_slots_total")?,
            normal_slots_cost: try_get_amount(row, "normal_slots_cost")?,
            emergency_slots_cost: try_get_amount(row, "emergency_slots_cost")?,
            emergency_charges: try_get_amount(row, "emergency_charges")?,
            total_price: try_get_amount(row, "total_price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
