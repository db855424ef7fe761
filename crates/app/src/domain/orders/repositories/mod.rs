//! Order Repositories

mod allocations;
mod orders;

pub(crate) use allocations::PgAllocationsRepository;
pub(crate) use orders::{NewOrder, PgOrdersRepository};
