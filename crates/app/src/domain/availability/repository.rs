//! Availability Repository

use jiff::civil::Date;
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::availability::models::{AvailableDay, AvailableDayUuid, DayCapacity};

const GET_DAY_SQL: &str = include_str!("sql/get_day.sql");
const GET_DAY_BY_UUID_SQL: &str = include_str!("sql/get_day_by_uuid.sql");
const LIST_DAYS_SQL: &str = include_str!("sql/list_days.sql");
const UPSERT_DAY_SQL: &str = include_str!("sql/upsert_day.sql");
const INCREMENT_BOOKED_SQL: &str = include_str!("sql/increment_booked.sql");
const PURGE_DAYS_SQL: &str = include_str!("sql/purge_days.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAvailabilityRepository;

impl PgAvailabilityRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_day(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        date: Date,
    ) -> Result<Option<AvailableDay>, sqlx::Error> {
        query_as::<Postgres, AvailableDay>(GET_DAY_SQL)
            .bind(SqlxDate::from(date))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_day_by_uuid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        day: AvailableDayUuid,
    ) -> Result<Option<AvailableDay>, sqlx::Error> {
        query_as::<Postgres, AvailableDay>(GET_DAY_BY_UUID_SQL)
            .bind(day.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_days(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        from: Date,
        to: Date,
    ) -> Result<Vec<AvailableDay>, sqlx::Error> {
        query_as::<Postgres, AvailableDay>(LIST_DAYS_SQL)
            .bind(SqlxDate::from(from))
            .bind(SqlxDate::from(to))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn upsert_day(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        day: AvailableDayUuid,
        date: Date,
        capacity: DayCapacity,
    ) -> Result<AvailableDay, sqlx::Error> {
        query_as::<Postgres, AvailableDay>(UPSERT_DAY_SQL)
            .bind(day.into_uuid())
            .bind(SqlxDate::from(date))
            .bind(try_into_db_count(capacity.normal_slots, "normal_slots")?)
            .bind(try_into_db_count(capacity.emergency_slots, "emergency_slots")?)
            .bind(try_into_db_amount(
                capacity.emergency_surcharge,
                "emergency_surcharge",
            )?)
            .bind(capacity.is_available)
            .fetch_one(&mut **tx)
            .await
    }

    /// The only statement in the system that moves booked counters.
    ///
    /// The WHERE clause refuses any increment that would push either counter
    /// past its capacity; callers treat zero affected rows as a capacity
    /// violation (or a vanished day), never as something to clamp.
    pub(crate) async fn increment_booked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        day: AvailableDayUuid,
        normal_delta: u32,
        emergency_delta: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(INCREMENT_BOOKED_SQL)
            .bind(day.into_uuid())
            .bind(try_into_db_count(normal_delta, "normal_booked")?)
            .bind(try_into_db_count(emergency_delta, "emergency_booked")?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn purge_before(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        before: Date,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(PURGE_DAYS_SQL)
            .bind(SqlxDate::from(before))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for AvailableDay {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AvailableDayUuid::from_uuid(row.try_get("uuid")?),
            date: row.try_get::<SqlxDate, _>("date")?.to_jiff(),
            normal_slots: try_get_count(row, "normal_slots")?,
            emergency_slots: try_get_count(row, "emergency_slots")?,
            normal_booked: try_get_count(row, "normal_booked")?,
            emergency_booked: try_get_count(row, "emergency_booked")?,
            emergency_surcharge: try_get_amount(row, "emergency_surcharge")?,
            is_available: row.try_get("is_available")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(col)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn try_get_count(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let count_i32: i32 = row.try_get(col)?;

    u32::try_from(count_i32).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn try_into_db_count(count: u32, col: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn try_into_db_amount(amount: u64, col: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}
