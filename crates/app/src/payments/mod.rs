//! Payment collaborators
//!
//! The remote gateway client used to create payment orders, and the
//! HMAC-SHA256 signature check applied to every payment confirmation the
//! gateway delivers back.

pub mod gateway;
pub mod signature;

pub use gateway::*;
pub use signature::*;
