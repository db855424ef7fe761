//! Carts
//!
//! One cart per customer. Adding an item runs the allocation planner and the
//! single-item capacity gate against the live ledger and persists the priced
//! result; items are only ever removed whole, never edited in place.

pub mod errors;
pub mod models;
pub(crate) mod repositories;
pub mod service;

pub use errors::CartsServiceError;
pub use service::*;
