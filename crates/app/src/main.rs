//! Atelier Application CLI

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let parsed = cli::Cli::parse();

    if let Err(error) = parsed.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
