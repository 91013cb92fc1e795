//! # period-engine
//!
//! Deterministic date-range resolution and period-over-period comparison for
//! sales analytics dashboards.
//!
//! Every dashboard page filters its aggregation queries by a window chosen
//! with a `range` token, and comparison views pair each category's current
//! totals with the totals of the immediately preceding window. This crate
//! holds that logic as pure functions; query execution and rendering live in
//! the callers.
//!
//! ## Modules
//!
//! - [`timeframe`] — range token → concrete [`DateRange`], previous period, input parsing
//! - [`comparison`] — merge current/previous per-category aggregates
//! - [`change`] — percentage change with an explicit "new" variant
//! - [`channels`] — the sales-by-channel table (shares, averages, trends)
//! - [`sparkline`] — trend sparkline geometry and tooltips
//! - [`share`] — share of total and top-N concentration
//! - [`series`] — weekly bucketing and revenue series summary
//! - [`format`] — en-US display formatting
//! - [`error`] — Error types

pub mod change;
pub mod channels;
pub mod comparison;
pub mod error;
pub mod format;
pub mod series;
pub mod share;
pub mod sparkline;
pub mod timeframe;

pub use change::{percentage_change, percentage_change_opt, PercentChange, Trend};
pub use channels::{build_channel_table, ChannelRow, ChannelTable, ChannelTotals, TableOptions};
pub use comparison::{
    merge_period_series, merge_periods, CategoryMetrics, CategoryTotals, PeriodMetric,
};
pub use error::PeriodError;
pub use series::{summarize_series, weekly_buckets, SeriesSummary, WeekBucket, WeeklyRevenue};
pub use share::{concentration, share_percent, ShareBar};
pub use sparkline::Sparkline;
pub use timeframe::{
    parse_reference_now, previous_period, previous_period_from_str, range_from_query, resolve,
    resolve_frame, resolve_with_options, DateRange, ResolveOptions, TimeFrame,
};
