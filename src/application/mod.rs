//! Application services orchestrating the conversion pipeline.

pub mod convert;
pub mod error;
