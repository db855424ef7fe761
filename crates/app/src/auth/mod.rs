//! Auth
//!
//! The auth collaborator: maps a bearer API token to a stable customer
//! identifier. Everything downstream treats that identifier as opaque.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;
pub mod token;

pub use errors::AuthServiceError;
pub use models::*;
pub use service::*;
pub use token::*;
