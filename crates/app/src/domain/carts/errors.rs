//! Carts service errors.

use atelier::availability::SlotClass;
use atelier::validation::ValidationError;
use jiff::civil::Date;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("quantity {quantity} is outside the allowed range of 1 to 10")]
    InvalidQuantity { quantity: u32 },

    #[error("at least one production date must be selected")]
    NoDatesSelected,

    #[error("{date} is selected more than once")]
    DuplicateDate { date: Date },

    #[error("the chosen material does not belong to this product")]
    UnknownMaterial,

    #[error("{date} is no longer available for booking")]
    DayUnavailable { date: Date },

    #[error("the selected dates are short {missing} slot(s) for this quantity")]
    InsufficientCapacity { missing: u32 },

    #[error("{date} has {available} {class} slot(s) remaining but {required} are required")]
    Shortfall {
        date: Date,
        class: SlotClass,
        available: u32,
        required: u32,
    },

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

impl From<Error> for CartsServiceError {
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

impl From<ValidationError> for CartsServiceError {
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
