//! Windowed aggregation and baseline-deviation scoring.

pub mod aggregate;
pub mod baseline;
pub mod select;
