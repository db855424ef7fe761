//! Payment gateway client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Configuration for connecting to the payment gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway API address, e.g. `"https://api.gateway.example"`.
    pub addr: String,

    /// API key identifier, used as the basic-auth username.
    pub key_id: String,

    /// API key secret, used as the basic-auth password.
    pub key_secret: String,
}

/// A payment order created on the gateway's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    /// The gateway's identifier for the remote order.
    pub id: String,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a remote payment order for the given amount.
    ///
    /// `amount` is in minor units of `currency`; `receipt` is an opaque
    /// caller reference echoed back by the gateway.
    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;
}

/// HTTP client for the payment gateway's order API.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    config: GatewayConfig,
    http: Client,
}

impl HttpPaymentGateway {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        amount: u64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.config.addr);

        let body = serde_json::json!({
            "amount": amount,
            "currency": currency,
            "receipt": receipt,
        });

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(GatewayError::UnexpectedResponse(format!(
                "order creation failed with status {status}: {text}"
            )));
        }

        let parsed: CreateOrderResponse = response.json().await?;

        Ok(GatewayOrder { id: parsed.id })
    }
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
}

/// Errors that can occur when communicating with the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned a non-2xx response or unexpected body.
    #[error("unexpected response from payment gateway: {0}")]
    UnexpectedResponse(String),
}
