//! Read-only vocabulary statistics: totals, status split, success rate and
//! the daily growth curve

pub mod aggregator;
pub mod models;

pub use aggregator::StatsAggregator;
pub use models::*;
