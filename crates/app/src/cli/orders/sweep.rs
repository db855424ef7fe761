use std::sync::Arc;

use atelier_app::{
    context::CURRENCY,
    database::{self, Db},
    domain::orders::{OrdersService, PgOrdersService},
    notifications::TracingNotifications,
    payments::{GatewayConfig, HttpPaymentGateway, PaymentSignatureKey},
};
use clap::Args;
use jiff::Timestamp;

#[derive(Debug, Args)]
pub(crate) struct SweepArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Payment gateway API address
    #[arg(long, env = "GATEWAY_ADDR")]
    gateway_addr: String,

    /// Payment gateway key id
    #[arg(long, env = "GATEWAY_KEY_ID")]
    gateway_key_id: String,

    /// Payment gateway key secret
    #[arg(long, env = "GATEWAY_KEY_SECRET", hide_env_values = true)]
    gateway_key_secret: String,

    /// Cancel pending orders older than this many hours
    #[arg(long, default_value_t = 24)]
    older_than_hours: i64,
}

pub(crate) async fn run(args: SweepArgs) -> Result<(), String> {
    let cutoff = Timestamp::now()
        .checked_sub(jiff::Span::new().hours(args.older_than_hours))
        .map_err(|error| format!("invalid cutoff: {error}"))?;

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let signature_key = PaymentSignatureKey::new(args.gateway_key_secret.clone());

    let service = PgOrdersService::new(
        Db::new(pool),
        Arc::new(HttpPaymentGateway::new(GatewayConfig {
            addr: args.gateway_addr,
            key_id: args.gateway_key_id,
            key_secret: args.gateway_key_secret,
        })),
        signature_key,
        Arc::new(TracingNotifications::new()),
        CURRENCY,
    );

    let swept = service
        .sweep_stale_pending(cutoff)
        .await
        .map_err(|error| format!("failed to sweep orders: {error}"))?;

    println!("orders_swept: {swept}");

    Ok(())
}
