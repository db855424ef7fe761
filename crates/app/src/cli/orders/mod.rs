use clap::{Args, Subcommand};

mod sweep;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// Cancel pending orders whose payment never arrived.
    Sweep(sweep::SweepArgs),
}

pub(crate) async fn run(command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::Sweep(args) => sweep::run(args).await,
    }
}
