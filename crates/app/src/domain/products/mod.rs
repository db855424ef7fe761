//! Products
//!
//! The catalog collaborator: base prices, fabric materials with handling
//! costs, and the shop-fabric discount the pricing engine applies.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;
