//! Availability service errors.

use jiff::civil::Date;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvailabilityServiceError {
    #[error("day not found")]
    NotFound,

    #[error("day already exists")]
    AlreadyExists,

    #[error("invalid capacity data")]
    InvalidData,

    #[error("missing required data")]
    MissingRequiredData,

    /// The increment would push a booked counter past capacity. This is the
    /// last line of defense against overselling; it rejects, never clamps.
    #[error("booking {date} would exceed its remaining capacity")]
    CapacityExceeded { date: Date },

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AvailabilityServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::ForeignKeyViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
