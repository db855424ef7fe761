//! Auth Models

use jiff::Timestamp;
use uuid::Uuid;

use crate::{auth::token::ApiTokenVersion, domain::CustomerUuid};

/// Stored metadata for an issued API token. The secret itself is never
/// persisted, only its HMAC verifier.
#[derive(Debug, Clone)]
pub struct ApiTokenMetadata {
    pub uuid: Uuid,
    pub customer_uuid: CustomerUuid,
    pub version: ApiTokenVersion,
    pub token_hash: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

/// Field set for persisting a freshly issued token.
#[derive(Debug, Clone)]
pub struct NewApiToken {
    pub uuid: Uuid,
    pub customer_uuid: CustomerUuid,
    pub version: ApiTokenVersion,
    pub token_hash: String,
    pub expires_at: Option<Timestamp>,
}

/// A newly issued token: the one-time plaintext plus its stored metadata.
#[derive(Debug, Clone)]
pub struct IssuedApiToken {
    pub token: String,
    pub metadata: ApiTokenMetadata,
}
