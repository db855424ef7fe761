//! Products Repository

use atelier::pricing::Discount;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::availability::repository::{try_get_amount, try_into_db_amount};
use crate::domain::products::models::{Material, MaterialUuid, NewMaterial, Product, ProductUuid};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");
const CREATE_MATERIAL_SQL: &str = include_str!("sql/create_material.sql");
const GET_MATERIALS_SQL: &str = include_str!("sql/get_materials.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Product>, sqlx::Error> {
        query_as::<Postgres, Product>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    /// Fetch one product together with its material options.
    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Option<Product>, sqlx::Error> {
        let product = query_as::<Postgres, Product>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        let Some(mut product) = product else {
            return Ok(None);
        };

        product.materials = query_as::<Postgres, Material>(GET_MATERIALS_SQL)
            .bind(product.uuid.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(Some(product))
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        base_price: u64,
        fabric_discount: Option<Discount>,
        materials: &[NewMaterial],
    ) -> Result<Product, sqlx::Error> {
        let (discount_kind, discount_value) = discount_columns(fabric_discount)?;

        let mut created = query_as::<Postgres, Product>(CREATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(try_into_db_amount(base_price, "base_price")?)
            .bind(discount_kind)
            .bind(discount_value)
            .fetch_one(&mut **tx)
            .await?;

        for material in materials {
            query(CREATE_MATERIAL_SQL)
                .bind(material.uuid.into_uuid())
                .bind(product.into_uuid())
                .bind(&material.name)
                .bind(try_into_db_amount(material.extra_cost, "extra_cost")?)
                .execute(&mut **tx)
                .await?;
        }

        created.materials = query_as::<Postgres, Material>(GET_MATERIALS_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(created)
    }

    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        base_price: u64,
        fabric_discount: Option<Discount>,
    ) -> Result<Product, sqlx::Error> {
        let (discount_kind, discount_value) = discount_columns(fabric_discount)?;

        query_as::<Postgres, Product>(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(try_into_db_amount(base_price, "base_price")?)
            .bind(discount_kind)
            .bind(discount_value)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn discount_columns(
    discount: Option<Discount>,
) -> Result<(Option<&'static str>, Option<i64>), sqlx::Error> {
    match discount {
        None => Ok((None, None)),
        Some(Discount::PercentageOff { basis_points }) => Ok((
            Some("percentage_off"),
            Some(i64::from(basis_points)),
        )),
        Some(Discount::AmountOff { amount }) => Ok((
            Some("amount_off"),
            Some(try_into_db_amount(amount, "fabric_discount_value")?),
        )),
    }
}

fn discount_from_columns(
    kind: Option<&str>,
    value: Option<i64>,
) -> Result<Option<Discount>, sqlx::Error> {
    let decode_error = |message: &str| sqlx::Error::ColumnDecode {
        index: "fabric_discount_kind".to_string(),
        source: message.into(),
    };

    match (kind, value) {
        (None, None) => Ok(None),
        (Some("percentage_off"), Some(value)) => {
            let basis_points = u32::try_from(value)
                .map_err(|_| decode_error("negative percentage discount"))?;

            Ok(Some(Discount::PercentageOff { basis_points }))
        }
        (Some("amount_off"), Some(value)) => {
            let amount =
                u64::try_from(value).map_err(|_| decode_error("negative amount discount"))?;

            Ok(Some(Discount::AmountOff { amount }))
        }
        _ => Err(decode_error("inconsistent fabric discount columns")),
    }
}

impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let discount_kind: Option<String> = row.try_get("fabric_discount_kind")?;
        let discount_value: Option<i64> = row.try_get("fabric_discount_value")?;

        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            base_price: try_get_amount(row, "base_price")?,
            fabric_discount: discount_from_columns(discount_kind.as_deref(), discount_value)?,
            materials: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Material {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: MaterialUuid::from_uuid(row.try_get("uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            name: row.try_get("name")?,
            extra_cost: try_get_amount(row, "extra_cost")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
