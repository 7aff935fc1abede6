//! Rolling per-poll tracking for sparklines and rate display.

use std::collections::VecDeque;
use std::time::Instant;

use super::stats::DashboardStats;

/// Maximum number of polls to keep.
const MAX_HISTORY_SIZE: usize = 60;

/// Tracks totals across refresh cycles to enable trend indicators.
///
/// The statistics record itself is rebuilt from scratch every cycle; this
/// is the only state that survives between cycles, and it only feeds the
/// sparkline and rate widgets.
#[derive(Debug, Clone)]
pub struct History {
    /// Total log counts per poll.
    pub total_logs: VecDeque<u64>,
    /// Total attack counts per poll.
    pub total_attacks: VecDeque<u64>,
    /// Poll instants for rate calculations.
    pub timestamps: VecDeque<Instant>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            total_logs: VecDeque::new(),
            total_attacks: VecDeque::new(),
            timestamps: VecDeque::new(),
        }
    }

    /// Record one refresh cycle's totals.
    pub fn record(&mut self, stats: &DashboardStats) {
        push_bounded(&mut self.total_logs, stats.total_logs);
        push_bounded(&mut self.total_attacks, stats.total_attacks);

        self.timestamps.push_back(Instant::now());
        if self.timestamps.len() > MAX_HISTORY_SIZE {
            self.timestamps.pop_front();
        }
    }

    /// Sparkline data for attack totals (normalized to 0-7 bar levels).
    pub fn attacks_sparkline(&self) -> Vec<u8> {
        normalize_sparkline(&self.total_attacks)
    }

    /// Sparkline data for log totals.
    pub fn logs_sparkline(&self) -> Vec<u8> {
        normalize_sparkline(&self.total_logs)
    }

    /// Logs-per-second between the last two polls, if computable.
    ///
    /// This is the live arrival rate, as opposed to the statistics
    /// record's `logs_per_second`, which spans the whole history window.
    pub fn poll_rate(&self) -> Option<f64> {
        if self.total_logs.len() < 2 || self.timestamps.len() < 2 {
            return None;
        }

        let current = *self.total_logs.back()?;
        let previous = *self.total_logs.get(self.total_logs.len() - 2)?;
        let delta = current as i64 - previous as i64;

        let current_time = self.timestamps.back()?;
        let previous_time = self.timestamps.get(self.timestamps.len() - 2)?;
        let elapsed = current_time.duration_since(*previous_time).as_secs_f64();

        if elapsed > 0.0 {
            Some(delta as f64 / elapsed)
        } else {
            None
        }
    }
}

fn push_bounded(values: &mut VecDeque<u64>, value: u64) {
    values.push_back(value);
    if values.len() > MAX_HISTORY_SIZE {
        values.pop_front();
    }
}

/// Normalize per-poll deltas to the 0-7 range for sparkline display.
///
/// Returns an empty Vec if there's not enough history.
fn normalize_sparkline(values: &VecDeque<u64>) -> Vec<u8> {
    if values.len() < 2 {
        return Vec::new();
    }

    let deltas: Vec<i64> =
        values.iter().zip(values.iter().skip(1)).map(|(a, b)| *b as i64 - *a as i64).collect();

    if deltas.is_empty() {
        return Vec::new();
    }

    let max = deltas.iter().copied().max().unwrap_or(1).max(1);
    let min = deltas.iter().copied().min().unwrap_or(0).min(0);
    let range = (max - min).max(1) as f64;

    deltas
        .iter()
        .map(|&v| {
            let normalized = ((v - min) as f64 / range * 7.0) as u8;
            normalized.min(7)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with(total_logs: u64, total_attacks: u64) -> DashboardStats {
        DashboardStats {
            total_logs,
            total_attacks,
            ..DashboardStats::default()
        }
    }

    #[test]
    fn test_record_bounds_history() {
        let mut history = History::new();
        for i in 0..80 {
            history.record(&stats_with(i, 0));
        }
        assert_eq!(history.total_logs.len(), MAX_HISTORY_SIZE);
        assert_eq!(history.timestamps.len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_sparkline_needs_two_polls() {
        let mut history = History::new();
        assert!(history.attacks_sparkline().is_empty());

        history.record(&stats_with(1, 1));
        assert!(history.attacks_sparkline().is_empty());

        history.record(&stats_with(5, 3));
        assert_eq!(history.attacks_sparkline().len(), 1);
    }

    #[test]
    fn test_sparkline_values_in_range() {
        let mut history = History::new();
        for i in [0u64, 3, 3, 10, 12, 30] {
            history.record(&stats_with(i, i));
        }
        let sparkline = history.logs_sparkline();
        assert_eq!(sparkline.len(), 5);
        assert!(sparkline.iter().all(|&v| v <= 7));
    }

    #[test]
    fn test_poll_rate_none_with_single_poll() {
        let mut history = History::new();
        history.record(&stats_with(10, 0));
        assert!(history.poll_rate().is_none());
    }
}
