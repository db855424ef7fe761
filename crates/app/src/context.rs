//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, AuthTokenKey, PgAuthService},
    database::{self, Db},
    domain::{
        availability::{AvailabilityService, PgAvailabilityService},
        carts::{CartsService, PgCartsService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
    },
    notifications::TracingNotifications,
    payments::{GatewayConfig, HttpPaymentGateway, PaymentSignatureKey},
};

/// Currency the gateway charges in.
pub const CURRENCY: &str = "inr";

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub availability: Arc<dyn AvailabilityService>,
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    /// Build application context from a database URL and collaborator
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        gateway: GatewayConfig,
        auth_key: AuthTokenKey,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url).await.map_err(AppInitError::Database)?;

        let db = Db::new(pool.clone());

        let signature_key = PaymentSignatureKey::new(gateway.key_secret.clone());

        Ok(Self {
            availability: Arc::new(PgAvailabilityService::new(db.clone())),
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(
                db,
                Arc::new(HttpPaymentGateway::new(gateway)),
                signature_key,
                Arc::new(TracingNotifications::new()),
                CURRENCY,
            )),
            auth: Arc::new(PgAuthService::new(pool, auth_key)),
        })
    }
}
