use atelier_app::{
    database::{self, Db},
    domain::availability::{AvailabilityService, PgAvailabilityService, models::DayCapacity},
};
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct ApplyMonthArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Calendar year
    #[arg(long)]
    year: i16,

    /// Calendar month (1-12)
    #[arg(long)]
    month: i8,

    /// Normal slots per day
    #[arg(long)]
    normal_slots: u32,

    /// Emergency slots per day
    #[arg(long)]
    emergency_slots: u32,

    /// Per-slot emergency surcharge in minor units
    #[arg(long, default_value_t = 0)]
    emergency_surcharge: u64,
}

pub(crate) async fn run(args: ApplyMonthArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgAvailabilityService::new(Db::new(pool));

    let applied = service
        .apply_month_defaults(
            args.year,
            args.month,
            DayCapacity {
                normal_slots: args.normal_slots,
                emergency_slots: args.emergency_slots,
                emergency_surcharge: args.emergency_surcharge,
                is_available: true,
            },
        )
        .await
        .map_err(|error| format!("failed to apply month defaults: {error}"))?;

    println!("days_applied: {applied}");

    Ok(())
}
