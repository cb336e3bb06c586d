//! Pure business logic, no I/O: order pricing and the transaction lifecycle.

pub mod pricing;
pub mod transaction;
