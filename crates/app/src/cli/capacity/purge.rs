use atelier_app::{
    database::{self, Db},
    domain::availability::{AvailabilityService, PgAvailabilityService},
};
use clap::Args;
use jiff::{Zoned, civil::Date};

#[derive(Debug, Args)]
pub(crate) struct PurgeArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Delete days strictly before this date; defaults to yesterday, so
    /// yesterday's row is the oldest one kept.
    #[arg(long)]
    before: Option<String>,
}

pub(crate) async fn run(args: PurgeArgs) -> Result<(), String> {
    let before: Date = match args.before {
        Some(raw) => raw.parse().map_err(|error| format!("invalid date: {error}"))?,
        None => Zoned::now()
            .date()
            .yesterday()
            .map_err(|error| format!("invalid purge cutoff: {error}"))?,
    };

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgAvailabilityService::new(Db::new(pool));

    let purged = service
        .purge_days_before(before)
        .await
        .map_err(|error| format!("failed to purge days: {error}"))?;

    println!("days_purged: {purged}");

    Ok(())
}
