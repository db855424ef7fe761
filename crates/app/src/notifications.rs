//! Notification collaborator.
//!
//! Confirmation delivery is best-effort by contract: a failure here is
//! logged and never rolls back a committed booking.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::info;

use crate::domain::{CustomerUuid, orders::models::Order};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[automock]
#[async_trait]
pub trait NotificationsService: Send + Sync {
    /// Tell the customer their orders are confirmed.
    async fn order_confirmed(
        &self,
        customer: CustomerUuid,
        orders: &[Order],
    ) -> Result<(), NotificationError>;
}

/// Log-only notifier used until a real delivery channel is wired in.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifications;

impl TracingNotifications {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationsService for TracingNotifications {
    async fn order_confirmed(
        &self,
        customer: CustomerUuid,
        orders: &[Order],
    ) -> Result<(), NotificationError> {
        for order in orders {
            info!(
                customer = %customer,
                order = %order.uuid,
                amount = order.amount,
                "order confirmation notification"
            );
        }

        Ok(())
    }
}
