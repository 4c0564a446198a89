//! Request-scoped domain values and their invariants.

pub mod conversion;
pub mod error;
pub mod uploads;
