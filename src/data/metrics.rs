//! Derived-metric computation.
//!
//! Runs after the aggregation pass and extends the statistics record with
//! throughput and detection-rate figures. The widget-level numbers the
//! views render (average processing time, load balance, uptime, pending
//! count) live here too, as pure functions on the record.

use chrono::{DateTime, Utc};

use super::stats::DashboardStats;

/// Fill in `logs_per_second` and `detection_rate` on an aggregated record.
///
/// Throughput is the total log count over the observed timeline span,
/// rounded to one decimal. With fewer than two timeline points, or a zero
/// span, the raw log count stands in. The detection rate is the
/// percentage of result-bearing entries predicted correctly, one decimal,
/// 0 when no entry carries a result yet.
pub fn calculate_metrics(stats: &mut DashboardStats) {
    stats.logs_per_second = if stats.timeline.len() >= 2 {
        let first = stats.timeline.iter().min();
        let last = stats.timeline.iter().max();
        match (first, last) {
            (Some(first), Some(last)) => {
                let span_secs = (*last - *first).num_milliseconds() as f64 / 1000.0;
                if span_secs > 0.0 {
                    round1(stats.total_logs as f64 / span_secs)
                } else {
                    stats.total_logs as f64
                }
            }
            _ => stats.total_logs as f64,
        }
    } else {
        stats.total_logs as f64
    };

    stats.detection_rate = if stats.performance.logs_with_results > 0 {
        round1(
            stats.performance.correct_predictions as f64
                / stats.performance.logs_with_results as f64
                * 100.0,
        )
    } else {
        0.0
    };
}

impl DashboardStats {
    /// Mean processing time over result-bearing entries, milliseconds.
    pub fn average_processing_time(&self) -> f64 {
        if self.performance.logs_with_results == 0 {
            return 0.0;
        }
        self.performance.total_processing_time / self.performance.logs_with_results as f64
    }

    /// Load-balance score across workers, in percent.
    ///
    /// Penalizes skew between the busiest and least-busy worker:
    /// `100 - (max - min) / max * 50`. With fewer than two workers the
    /// score is 100.
    pub fn load_balance_efficiency(&self) -> f64 {
        let loads: Vec<u64> = self.workers.values().map(|w| w.logs).collect();
        if loads.len() < 2 {
            return 100.0;
        }
        let max = loads.iter().copied().max().unwrap_or(0);
        let min = loads.iter().copied().min().unwrap_or(0);
        if max == 0 {
            return 100.0;
        }
        100.0 - (max - min) as f64 / max as f64 * 50.0
    }

    /// The earliest instant on the timeline, if any.
    pub fn uptime_since(&self) -> Option<DateTime<Utc>> {
        self.timeline.iter().min().copied()
    }

    /// Entries dispatched but not yet carrying a result.
    pub fn pending_logs(&self) -> u64 {
        self.total_logs.saturating_sub(self.performance.logs_with_results)
    }
}

/// Format an elapsed span as `"3h 12m"` for the uptime widget.
pub fn format_uptime(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - since).num_minutes().max(0);
    format!("{}h {}m", elapsed / 60, elapsed % 60)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
