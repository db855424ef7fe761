//! Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    CustomerUuid,
    carts::models::{Cart, CartUuid, DeliveryAddress},
};

const GET_CART_BY_CUSTOMER_SQL: &str = include_str!("../sql/get_cart_by_customer.sql");
const CREATE_CART_SQL: &str = include_str!("../sql/create_cart.sql");
const SET_DELIVERY_ADDRESS_SQL: &str = include_str!("../sql/set_delivery_address.sql");
const DELETE_CART_SQL: &str = include_str!("../sql/delete_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart_by_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Option<Cart>, sqlx::Error> {
        query_as::<Postgres, Cart>(GET_CART_BY_CUSTOMER_SQL)
            .bind(customer.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        customer: CustomerUuid,
    ) -> Result<Cart, sqlx::Error> {
        query_as::<Postgres, Cart>(CREATE_CART_SQL)
            .bind(cart.into_uuid())
            .bind(customer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_delivery_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        address: &DeliveryAddress,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_DELIVERY_ADDRESS_SQL)
            .bind(cart.into_uuid())
            .bind(&address.name)
            .bind(&address.line1)
            .bind(address.line2.as_deref())
            .bind(&address.city)
            .bind(&address.postal_code)
            .bind(&address.phone)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Cart {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            customer_uuid: CustomerUuid::from_uuid(row.try_get("customer_uuid")?),
            delivery_address: try_get_address(row)?,
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

/// An address is present when its required columns are; the columns are only
/// ever written together.
fn try_get_address(row: &PgRow) -> Result<Option<DeliveryAddress>, sqlx::Error> {
    let name: Option<String> = row.try_get("delivery_name")?;

    let Some(name) = name else {
        return Ok(None);
    };

    Ok(Some(DeliveryAddress {
        name,
        line1: row.try_get("delivery_line1")?,
        line2: row.try_get("delivery_line2")?,
        city: row.try_get("delivery_city")?,
        postal_code: row.try_get("delivery_postal_code")?,
        phone: row.try_get("delivery_phone")?,
    }))
}
