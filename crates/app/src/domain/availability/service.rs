//! Availability service.

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;

use crate::{
    database::Db,
    domain::availability::{
        errors::AvailabilityServiceError,
        models::{AvailableDay, AvailableDayUuid, DayCapacity},
        repository::PgAvailabilityRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgAvailabilityService {
    db: Db,
    repository: PgAvailabilityRepository,
}

impl PgAvailabilityService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAvailabilityRepository::new(),
        }
    }
}

#[async_trait]
impl AvailabilityService for PgAvailabilityService {
    async fn list_days(
        &self,
        from: Date,
        to: Date,
    ) -> Result<Vec<AvailableDay>, AvailabilityServiceError> {
        let mut tx = self.db.begin().await?;

        let days = self.repository.list_days(&mut tx, from, to).await?;

        tx.commit().await?;

        Ok(days)
    }

    async fn get_day(&self, date: Date) -> Result<AvailableDay, AvailabilityServiceError> {
        let mut tx = self.db.begin().await?;

        let day = self.repository.get_day(&mut tx, date).await?;

        tx.commit().await?;

        day.ok_or(AvailabilityServiceError::NotFound)
    }

    async fn set_day(
        &self,
        date: Date,
        capacity: DayCapacity,
    ) -> Result<AvailableDay, AvailabilityServiceError> {
        let mut tx = self.db.begin().await?;

        let day = self
            .repository
            .upsert_day(&mut tx, AvailableDayUuid::new(), date, capacity)
            .await?;

        tx.commit().await?;

        Ok(day)
    }

    async fn apply_month_defaults(
        &self,
        year: i16,
        month: i8,
        defaults: DayCapacity,
    ) -> Result<u32, AvailabilityServiceError> {
        let first = Date::new(year, month, 1)
            .map_err(|_| AvailabilityServiceError::InvalidData)?;

        let mut tx = self.db.begin().await?;
        let mut applied = 0;

        for day in 1..=first.days_in_month() {
            let date =
                Date::new(year, month, day).map_err(|_| AvailabilityServiceError::InvalidData)?;

            self.repository
                .upsert_day(&mut tx, AvailableDayUuid::new(), date, defaults)
                .await?;

            applied += 1;
        }

        tx.commit().await?;

        Ok(applied)
    }

    async fn increment_booked(
        &self,
        day: AvailableDayUuid,
        normal_delta: u32,
        emergency_delta: u32,
    ) -> Result<(), AvailabilityServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self
            .repository
            .increment_booked(&mut tx, day, normal_delta, emergency_delta)
            .await?;

        if rows_affected == 0 {
            // Disambiguate a vanished day from a capacity violation.
            let existing = self.repository.get_day_by_uuid(&mut tx, day).await?;

            return match existing {
                None => Err(AvailabilityServiceError::NotFound),
                Some(existing) => Err(AvailabilityServiceError::CapacityExceeded {
                    date: existing.date,
                }),
            };
        }

        tx.commit().await?;

        Ok(())
    }

    async fn purge_days_before(&self, before: Date) -> Result<u64, AvailabilityServiceError> {
        let mut tx = self.db.begin().await?;

        let purged = self.repository.purge_before(&mut tx, before).await?;

        tx.commit().await?;

        Ok(purged)
    }
}

#[automock]
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Ledger rows in a date range, in calendar order. This is the
    /// administrative view: raw capacities are returned even for days with
    /// `is_available` switched off.
    async fn list_days(
        &self,
        from: Date,
        to: Date,
    ) -> Result<Vec<AvailableDay>, AvailabilityServiceError>;

    /// A single ledger row.
    async fn get_day(&self, date: Date) -> Result<AvailableDay, AvailabilityServiceError>;

    /// Create or update one day's capacity settings. Booked counters are
    /// preserved across edits.
    async fn set_day(
        &self,
        date: Date,
        capacity: DayCapacity,
    ) -> Result<AvailableDay, AvailabilityServiceError>;

    /// Apply default capacity settings to every day of a month.
    async fn apply_month_defaults(
        &self,
        year: i16,
        month: i8,
        defaults: DayCapacity,
    ) -> Result<u32, AvailabilityServiceError>;

    /// Increment booked counters for a day.
    ///
    /// The sole writer path for booked counters. Rejects with
    /// [`AvailabilityServiceError::CapacityExceeded`] when the increment
    /// would exceed either capacity; the counters are never clamped.
    async fn increment_booked(
        &self,
        day: AvailableDayUuid,
        normal_delta: u32,
        emergency_delta: u32,
    ) -> Result<(), AvailabilityServiceError>;

    /// Delete ledger rows older than the given date. Returns the number of
    /// rows removed.
    async fn purge_days_before(&self, before: Date) -> Result<u64, AvailabilityServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;
    use tokio::task::JoinSet;

    use crate::test::{TestContext, helpers};

    use super::*;

    #[tokio::test]
    async fn set_day_creates_a_bookable_day() -> TestResult {
        let ctx = TestContext::new().await;

        let day = ctx
            .availability
            .set_day(
                date(2026, 9, 1),
                DayCapacity {
                    normal_slots: 4,
                    emergency_slots: 2,
                    emergency_surcharge: 20_00,
                    is_available: true,
                },
            )
            .await?;

        assert_eq!(day.date, date(2026, 9, 1));
        assert_eq!(day.normal_slots, 4);
        assert_eq!(day.normal_booked, 0);
        assert_eq!(day.emergency_surcharge, 20_00);

        Ok(())
    }

    #[tokio::test]
    async fn get_day_unknown_date_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.availability.get_day(date(2030, 1, 1)).await;

        assert!(
            matches!(result, Err(AvailabilityServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn set_day_edit_preserves_booked_counters() -> TestResult {
        let ctx = TestContext::new().await;

        let day = helpers::bookable_day(&ctx, date(2026, 9, 1), 4, 2).await?;
        ctx.availability.increment_booked(day.uuid, 3, 0).await?;

        let edited = ctx
            .availability
            .set_day(
                date(2026, 9, 1),
                DayCapacity {
                    normal_slots: 6,
                    emergency_slots: 2,
                    emergency_surcharge: 0,
                    is_available: true,
                },
            )
            .await?;

        assert_eq!(edited.normal_slots, 6);
        assert_eq!(edited.normal_booked, 3, "edits must not reset booked counts");

        Ok(())
    }

    #[tokio::test]
    async fn apply_month_defaults_covers_every_day() -> TestResult {
        let ctx = TestContext::new().await;

        let applied = ctx
            .availability
            .apply_month_defaults(
                2026,
                9,
                DayCapacity {
                    normal_slots: 5,
                    emergency_slots: 1,
                    emergency_surcharge: 10_00,
                    is_available: true,
                },
            )
            .await?;

        assert_eq!(applied, 30);

        let days = ctx
            .availability
            .list_days(date(2026, 9, 1), date(2026, 9, 30))
            .await?;

        assert_eq!(days.len(), 30);
        assert!(days.iter().all(|d| d.normal_slots == 5));

        Ok(())
    }

    #[tokio::test]
    async fn apply_month_defaults_preserves_existing_booked() -> TestResult {
        let ctx = TestContext::new().await;

        let day = helpers::bookable_day(&ctx, date(2026, 9, 15), 4, 0).await?;
        ctx.availability.increment_booked(day.uuid, 2, 0).await?;

        ctx.availability
            .apply_month_defaults(
                2026,
                9,
                DayCapacity {
                    normal_slots: 8,
                    emergency_slots: 2,
                    emergency_surcharge: 0,
                    is_available: true,
                },
            )
            .await?;

        let day = ctx.availability.get_day(date(2026, 9, 15)).await?;

        assert_eq!(day.normal_slots, 8);
        assert_eq!(day.normal_booked, 2);

        Ok(())
    }

    #[tokio::test]
    async fn increment_past_capacity_is_rejected_not_clamped() -> TestResult {
        let ctx = TestContext::new().await;

        let day = helpers::bookable_day(&ctx, date(2026, 9, 1), 4, 2).await?;
        ctx.availability.increment_booked(day.uuid, 2, 0).await?;

        let result = ctx.availability.increment_booked(day.uuid, 1, 0).await;

        assert!(
            matches!(
                result,
                Err(AvailabilityServiceError::CapacityExceeded { date: d }) if d == date(2026, 9, 1)
            ),
            "expected CapacityExceeded, got {result:?}"
        );

        let day = ctx.availability.get_day(date(2026, 9, 1)).await?;
        assert_eq!(day.normal_booked, 4, "failed increment must not move the counter");

        Ok(())
    }

    #[tokio::test]
    async fn emergency_capacity_is_enforced_independently() -> TestResult {
        let ctx = TestContext::new().await;

        let day = helpers::bookable_day(&ctx, date(2026, 9, 1), 4, 1).await?;
        ctx.availability.increment_booked(day.uuid, 0, 1).await?;

        let result = ctx.availability.increment_booked(day.uuid, 0, 1).await;

        assert!(
            matches!(
                result,
                Err(AvailabilityServiceError::CapacityExceeded { .. })
            ),
            "expected CapacityExceeded, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_increments_never_oversell() -> TestResult {
        let ctx = TestContext::new().await;

        let day = helpers::bookable_day(&ctx, date(2026, 9, 1), 5, 0).await?;

        let mut attempts = JoinSet::new();

        for _ in 0..10 {
            let availability = ctx.availability.clone();
            let day_uuid = day.uuid;

            attempts.spawn(async move { availability.increment_booked(day_uuid, 1, 0).await });
        }

        let mut succeeded = 0;

        while let Some(result) = attempts.join_next().await {
            if result?.is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5, "exactly the capacity may be booked");

        let day = ctx.availability.get_day(date(2026, 9, 1)).await?;
        assert_eq!(day.normal_booked, 5);

        Ok(())
    }

    #[tokio::test]
    async fn purge_removes_only_older_days() -> TestResult {
        let ctx = TestContext::new().await;

        helpers::bookable_day(&ctx, date(2026, 8, 30), 2, 0).await?;
        helpers::bookable_day(&ctx, date(2026, 8, 31), 2, 0).await?;
        helpers::bookable_day(&ctx, date(2026, 9, 1), 2, 0).await?;

        let purged = ctx.availability.purge_days_before(date(2026, 9, 1)).await?;

        assert_eq!(purged, 2);

        let remaining = ctx
            .availability
            .list_days(date(2026, 8, 1), date(2026, 9, 30))
            .await?;

        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.first().map(|d| d.date), Some(date(2026, 9, 1)));

        Ok(())
    }
}
