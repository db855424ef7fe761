//! Order Allocations Repository

use jiff_sqlx::Date as SqlxDate;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::availability::models::AvailableDayUuid;
use crate::domain::availability::repository::{
    try_get_amount, try_get_count, try_into_db_amount, try_into_db_count,
};
use crate::domain::orders::models::{OrderUuid, SlotAllocation};

const CREATE_ALLOCATION_SQL: &str = include_str!("../sql/create_allocation.sql");
const GET_ALLOCATIONS_SQL: &str = include_str!("../sql/get_allocations.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAllocationsRepository;

impl PgAllocationsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_allocation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        position: u32,
        allocation: &SlotAllocation,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_ALLOCATION_SQL)
            .bind(order.into_uuid())
            .bind(try_into_db_count(position, "position")?)
            .bind(allocation.day_uuid.into_uuid())
            .bind(SqlxDate::from(allocation.date))
            .bind(try_into_db_count(allocation.normal_slots, "normal_slots")?)
            .bind(try_into_db_count(
                allocation.emergency_slots,
                "emergency_slots",
            )?)
            .bind(try_into_db_count(allocation.normal_booked, "normal_booked")?)
            .bind(try_into_db_count(
                allocation.emergency_booked,
                "emergency_booked",
            )?)
            .bind(try_into_db_count(allocation.normal_used, "normal_used")?)
            .bind(try_into_db_count(
                allocation.emergency_used,
                "emergency_used",
            )?)
            .bind(try_into_db_amount(
                allocation.emergency_surcharge,
                "emergency_surcharge",
            )?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn get_allocations(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<SlotAllocation>, sqlx::Error> {
        query_as::<Postgres, SlotAllocation>(GET_ALLOCATIONS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for SlotAllocation {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            day_uuid: AvailableDayUuid::from_uuid(row.try_get("day_uuid")?),
            date: row.try_get::<SqlxDate, _>("date")?.to_jiff(),
            normal_slots: try_get_count(row, "normal_slots")?,
            emergency_slots: try_get_count(row, "emergency_slots")?,
            normal_booked: try_get_count(row, "normal_booked")?,
            emergency_booked: try_get_count(row, "emergency_booked")?,
            normal_used: try_get_count(row, "normal_used")?,
            emergency_used: try_get_count(row, "emergency_used")?,
            emergency_surcharge: try_get_amount(row, "emergency_surcharge")?,
        })
    }
}
