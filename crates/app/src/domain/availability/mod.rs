//! Availability Ledger
//!
//! One row per production day: capacities, booked counters, emergency
//! surcharge and the administrative availability flag. The booked counters
//! are mutated through exactly one statement, a conditional UPDATE that
//! refuses any increment that would exceed capacity.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::AvailabilityServiceError;
pub use service::*;
