use clap::{Args, Subcommand};

mod apply_month;
mod purge;
mod set_day;

#[derive(Debug, Args)]
pub(crate) struct CapacityCommand {
    #[command(subcommand)]
    command: CapacitySubcommand,
}

#[derive(Debug, Subcommand)]
enum CapacitySubcommand {
    /// Apply default slot capacities to every day of a month.
    ApplyMonth(apply_month::ApplyMonthArgs),
    /// Create or edit a single day's capacities.
    SetDay(set_day::SetDayArgs),
    /// Delete ledger rows older than a date.
    Purge(purge::PurgeArgs),
}

pub(crate) async fn run(command: CapacityCommand) -> Result<(), String> {
    match command.command {
        CapacitySubcommand::ApplyMonth(args) => apply_month::run(args).await,
        CapacitySubcommand::SetDay(args) => set_day::run(args).await,
        CapacitySubcommand::Purge(args) => purge::run(args).await,
    }
}
