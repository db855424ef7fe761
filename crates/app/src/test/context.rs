//! Test context for service-level integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::{AuthTokenKey, PgAuthService},
    database::Db,
    domain::{
        CustomerUuid,
        availability::PgAvailabilityService,
        carts::PgCartsService,
        orders::PgOrdersService,
        products::PgProductsService,
    },
    notifications::TracingNotifications,
    payments::{GatewayError, GatewayOrder, PaymentGateway, PaymentSignatureKey, SignatureError},
};

use super::db::TestDb;

/// Shared secret the fake gateway "signs" confirmations with.
const TEST_PAYMENT_SECRET: &[u8] = b"atelier_test_payment_secret";

/// Server-side token key for auth tests.
const TEST_AUTH_KEY: &[u8] = b"atelier_test_auth_key";

/// In-process stand-in for the payment gateway: hands out unique order ids
/// without any network traffic.
#[derive(Debug, Clone, Default)]
struct FakeGateway;

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        _amount: u64,
        _currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        Ok(GatewayOrder {
            id: format!("gwo_{}", Uuid::now_v7().simple()),
        })
    }
}

pub(crate) struct TestContext {
    pub db: TestDb,
    pub customer_uuid: CustomerUuid,
    pub availability: PgAvailabilityService,
    pub products: PgProductsService,
    pub carts: PgCartsService,
    pub orders: PgOrdersService,
    pub auth: PgAuthService,
    payment_key: PaymentSignatureKey,
}

impl TestContext {
    pub(crate) async fn new() -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        let payment_key = PaymentSignatureKey::new(TEST_PAYMENT_SECRET);

        let orders = PgOrdersService::new(
            db.clone(),
            Arc::new(FakeGateway),
            payment_key.clone(),
            Arc::new(TracingNotifications::new()),
            "inr",
        );

        Self {
            availability: PgAvailabilityService::new(db.clone()),
            products: PgProductsService::new(db.clone()),
            carts: PgCartsService::new(db),
            orders,
            auth: PgAuthService::new(test_db.pool().clone(), AuthTokenKey::new(TEST_AUTH_KEY)),
            customer_uuid: CustomerUuid::new(),
            payment_key,
            db: test_db,
        }
    }

    /// Sign a confirmation the way the gateway would, for driving
    /// `verify_payment` in tests.
    pub(crate) fn payment_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
    ) -> Result<String, SignatureError> {
        self.payment_key.sign(gateway_order_id, payment_id)
    }
}
