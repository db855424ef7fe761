//! Auth service.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use mockall::automock;
use sha2::Sha256;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::{
        AuthServiceError,
        models::{ApiTokenMetadata, IssuedApiToken, NewApiToken},
        repository::PgAuthRepository,
        token::{
            ApiTokenVersion, build_verifier_input, format_api_token, generate_api_token_secret,
            parse_api_token,
        },
    },
    domain::CustomerUuid,
    payments::signature::{decode_hex, encode_hex},
};

type HmacSha256 = Hmac<Sha256>;

/// Server-side key that keys the token verifier HMAC.
#[derive(Clone)]
pub struct AuthTokenKey {
    secret: Vec<u8>,
}

impl AuthTokenKey {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for AuthTokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthTokenKey(**redacted**)")
    }
}

#[derive(Debug, Clone)]
pub struct PgAuthService {
    repository: PgAuthRepository,
    key: AuthTokenKey,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool, key: AuthTokenKey) -> Self {
        Self {
            repository: PgAuthRepository::new(pool),
            key,
        }
    }

    /// Issue a new API token for the given customer.
    ///
    /// The plaintext token is returned exactly once; only its HMAC verifier
    /// is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if HMAC computation or database insertion fails.
    pub async fn issue_api_token(
        &self,
        customer_uuid: CustomerUuid,
        expires_at: Option<Timestamp>,
    ) -> Result<IssuedApiToken, AuthServiceError> {
        let token_uuid = Uuid::now_v7();
        let version = ApiTokenVersion::V1;
        let secret = generate_api_token_secret();
        let token = format_api_token(token_uuid, version, &secret);

        let verifier_input = build_verifier_input(&token_uuid, version, &customer_uuid, &secret);
        let token_hash = self.hmac_hex(&verifier_input)?;

        let metadata = self
            .repository
            .create_api_token(&NewApiToken {
                uuid: token_uuid,
                customer_uuid,
                version,
                token_hash,
                expires_at,
            })
            .await?;

        Ok(IssuedApiToken { token, metadata })
    }

    /// Revoke a token by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError::NotFound`] when no live token matches.
    pub async fn revoke_api_token(&self, token_uuid: Uuid) -> Result<(), AuthServiceError> {
        let rows_affected = self.repository.revoke_api_token(token_uuid).await?;

        if rows_affected == 0 {
            return Err(AuthServiceError::NotFound);
        }

        Ok(())
    }

    fn hmac_hex(&self, input: &[u8]) -> Result<String, AuthServiceError> {
        let mut mac = HmacSha256::new_from_slice(&self.key.secret)
            .map_err(|_| AuthServiceError::InvalidKey)?;

        mac.update(input);

        Ok(encode_hex(&mac.finalize().into_bytes()))
    }

    fn verify_hmac(&self, input: &[u8], stored_hex: &str) -> bool {
        let Some(stored) = decode_hex(stored_hex) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key.secret) else {
            return false;
        };

        mac.update(input);

        mac.verify_slice(&stored).is_ok()
    }

    fn is_live(metadata: &ApiTokenMetadata, now: Timestamp) -> bool {
        if metadata.revoked_at.is_some() {
            return false;
        }

        match metadata.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate(&self, bearer: &str) -> Result<CustomerUuid, AuthServiceError> {
        let parsed =
            parse_api_token(bearer).map_err(|_| AuthServiceError::InvalidCredentials)?;

        let metadata = self
            .repository
            .get_api_token(parsed.token_uuid)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if metadata.version != parsed.version || !Self::is_live(&metadata, Timestamp::now()) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let verifier_input = build_verifier_input(
            &parsed.token_uuid,
            parsed.version,
            &metadata.customer_uuid,
            &parsed.secret,
        );

        if !self.verify_hmac(&verifier_input, &metadata.token_hash) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(metadata.customer_uuid)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer credential to the customer it belongs to.
    async fn authenticate(&self, bearer: &str) -> Result<CustomerUuid, AuthServiceError>;
}
