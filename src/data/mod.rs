//! Data models and processing for log-history snapshots.
//!
//! This module handles the transformation of raw log-history snapshots
//! into the derived statistics record the views render.
//!
//! ## Submodules
//!
//! - [`stats`]: The aggregation pass - classification, counting, worker
//!   bucketing, timeline collection
//! - [`metrics`]: Derived metrics (throughput, detection rate) and the
//!   pure widget-level computations
//! - [`worker`]: Worker URL to display-name resolution
//! - [`history`]: Cross-cycle tracking for sparklines and rate display
//!
//! ## Data Flow
//!
//! ```text
//! LogHistory (raw JSON)
//!        │
//!        ▼
//! stats::analyze()
//!        │
//!        ├──▶ DashboardStats (workers, attack buckets, timeline)
//!        │         │
//!        │         ▼
//!        │    metrics::calculate_metrics() (logs/s, detection rate)
//!        │
//!        └──▶ History::record() (for sparklines)
//! ```

pub mod history;
pub mod metrics;
pub mod stats;
pub mod worker;

pub use history::History;
pub use metrics::{calculate_metrics, format_uptime};
pub use stats::{
    analyze, AttackType, ConfidenceTier, DashboardStats, Performance, RecentAttack, WorkerStats,
    RECENT_ATTACKS_LIMIT,
};
pub use worker::{worker_display_name, LOCAL_WORKER, UNKNOWN_WORKER};
