use clap::{Parser, Subcommand};

mod capacity;
mod db;
mod orders;
mod token;

#[derive(Debug, Parser)]
#[command(name = "atelier-app", about = "Atelier CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Capacity(capacity::CapacityCommand),
    Orders(orders::OrdersCommand),
    Token(token::TokenCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Capacity(command) => capacity::run(command).await,
            Commands::Orders(command) => orders::run(command).await,
            Commands::Token(command) => token::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}
