//! Visit analytics engine
//!
//! Pure computations over in-memory visit records: durations, date range
//! resolution and aggregation. Nothing here performs I/O.

pub mod aggregator;
pub mod duration;
pub mod range;

pub use aggregator::{
    AggregateOptions, AggregateResult, Aggregator, Breakdown, LifetimeStats, ScalarStats, Series,
};
pub use duration::{duration_minutes, format_duration};
pub use range::{resolve, DateRange, RangeError, RangeRequest, RangeShortcut};
