//! Auth service errors.

use sqlx::Error;
use thiserror::Error;

use crate::auth::token::ApiTokenError;

#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// The credential is malformed, unknown, expired, revoked, or its
    /// verifier does not match. Deliberately one variant: callers learn
    /// nothing about which check failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token not found")]
    NotFound,

    #[error("invalid signing key")]
    InvalidKey,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("token processing error")]
    Token(#[source] ApiTokenError),
}

impl From<Error> for AuthServiceError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}

impl From<ApiTokenError> for AuthServiceError {
    fn from(error: ApiTokenError) -> Self {
        Self::Token(error)
    }
}
