use atelier_app::{
    database::{self, Db},
    domain::availability::{AvailabilityService, PgAvailabilityService, models::DayCapacity},
};
use clap::Args;
use jiff::civil::Date;

#[derive(Debug, Args)]
pub(crate) struct SetDayArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Calendar day (e.g. 2026-09-01)
    #[arg(long)]
    date: String,

    /// Normal slots
    #[arg(long)]
    normal_slots: u32,

    /// Emergency slots
    #[arg(long)]
    emergency_slots: u32,

    /// Per-slot emergency surcharge in minor units
    #[arg(long, default_value_t = 0)]
    emergency_surcharge: u64,

    /// Mark the day unavailable for booking
    #[arg(long)]
    unavailable: bool,
}

pub(crate) async fn run(args: SetDayArgs) -> Result<(), String> {
    let date: Date = args
        .date
        .parse()
        .map_err(|error| format!("invalid date: {error}"))?;

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgAvailabilityService::new(Db::new(pool));

    let day = service
        .set_day(
            date,
            DayCapacity {
                normal_slots: args.normal_slots,
                emergency_slots: args.emergency_slots,
                emergency_surcharge: args.emergency_surcharge,
                is_available: !args.unavailable,
            },
        )
        .await
        .map_err(|error| format!("failed to set day: {error}"))?;

    println!("date: {}", day.date);
    println!("normal_slots: {} (booked {})", day.normal_slots, day.normal_booked);
    println!(
        "emergency_slots: {} (booked {})",
        day.emergency_slots, day.emergency_booked
    );
    println!("is_available: {}", day.is_available);

    Ok(())
}
