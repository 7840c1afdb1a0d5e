//! Filtered aggregation engine.
//!
//! Given a snapshot of projects, phases, and expenses plus a filter set,
//! produces the derived series (cost trend, budget-vs-actual, burn rate,
//! overrun, status mix inputs, suspension reasons, delay correlation).
//! Owns a snapshot cache keyed by date range and a debounced recompute
//! trigger: a burst of filter changes collapses into one recompute.

pub mod engine;
pub mod filter;
pub mod series;
pub mod snapshot;
pub mod types;


pub use engine::{AnalyticsEngine, EngineCommand};
pub use filter::{AnalyticsFilter, DateRange};
pub use series::compute_report;
pub use snapshot::{AnalyticsSnapshot, ProjectData, SnapshotCache, SnapshotProvider};
pub use types::AnalyticsReport;
