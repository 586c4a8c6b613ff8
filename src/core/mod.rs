//! The chart engine and its supporting core types.
//!
//! Everything under `aggregate`, `chart`, `display`, `rates`, `series` and
//! `timeline` is pure and synchronous; async and I/O concerns live in the
//! provider and CLI layers.

pub mod aggregate;
pub mod cache;
pub mod chart;
pub mod config;
pub mod display;
pub mod log;
pub mod rates;
pub mod series;
pub mod timeline;

// Re-export main types for cleaner imports
pub use chart::{ChartData, ChartKind, ChartRequest, build_chart};
pub use display::{DisplayMode, ResolvedDisplay};
pub use rates::RateTable;
pub use series::{AccountHistoryProvider, AccountSeries, Notice, NoticeReason, RawAccountSeries};
pub use timeline::{GapFill, MergedTimeline, TimelinePoint};
