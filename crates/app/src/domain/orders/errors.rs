//! Orders service errors.

use atelier::availability::SlotClass;
use atelier::validation::ValidationError;
use jiff::civil::Date;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{domain::carts::models::CartItemUuid, payments::GatewayError};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("the cart has no items to check out")]
    EmptyCart,

    #[error("a delivery address is required before checkout")]
    MissingDeliveryAddress,

    #[error("{date} is no longer available for booking")]
    DayUnavailable { date: Date },

    #[error("{date} has {available} {class} slot(s) remaining but {required} are required")]
    Shortfall {
        date: Date,
        class: SlotClass,
        available: u32,
        required: u32,
    },

    /// A single item can no longer be fully placed on its selected dates.
    #[error("cart item {item} is short {missing} slot(s) for its quantity")]
    InsufficientCapacity { item: CartItemUuid, missing: u32 },

    /// The confirmation's signature did not verify. Security failure: the
    /// orders are cancelled and nothing touches the ledger.
    #[error("payment signature mismatch")]
    SignatureMismatch,

    #[error("order cannot move from {from} to {to}")]
    InvalidTransition {
        from: crate::domain::orders::models::OrderStatus,
        to: crate::domain::orders::models::OrderStatus,
    },

    #[error("payment gateway error")]
    Gateway(#[from] GatewayError),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<ValidationError> for OrdersServiceError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::DayUnavailable { date } => Self::DayUnavailable { date },
            ValidationError::Shortfall {
                date,
                class,
                available,
                required,
            } => Self::Shortfall {
                date,
                class,
                available,
                required,
            },
        }
    }
}
