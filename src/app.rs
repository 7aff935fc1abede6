//! Application state and navigation logic.

use anyhow::Result;

use crate::data::{analyze, calculate_metrics, DashboardStats, History, WorkerStats};
use crate::source::DataSource;
use crate::ui::workers::WorkerSortColumn;
use crate::ui::Theme;

/// The current view/tab in the TUI.
///
/// Worker detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Main counters, attack-type distribution, and performance widgets.
    Overview,
    /// Per-worker statistics table.
    Workers,
    /// Recent-attacks feed.
    Attacks,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Overview => View::Workers,
            View::Workers => View::Attacks,
            View::Attacks => View::Overview,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Overview => View::Attacks,
            View::Workers => View::Overview,
            View::Attacks => View::Workers,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Workers => "Workers",
            View::Attacks => "Attacks",
        }
    }
}

/// Connection state toward the master, shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Startup, before the first poll completes.
    Connecting,
    /// Last cycle succeeded.
    Connected { logs: u64 },
    /// Last cycle failed; the dashboard shows zeroed statistics until a
    /// later cycle succeeds.
    Disconnected { reason: String },
}

impl ConnectionStatus {
    /// Short label for the header indicator.
    pub fn label(&self) -> String {
        match self {
            ConnectionStatus::Connecting => "Connecting...".to_string(),
            ConnectionStatus::Connected { logs } => format!("Connected - {} logs", logs),
            ConnectionStatus::Disconnected { .. } => "Disconnected".to_string(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data source
    source: Box<dyn DataSource>,
    pub stats: Option<DashboardStats>,
    pub history: History,
    pub connection: ConnectionStatus,
    pub last_update: Option<std::time::Instant>,

    // Navigation state
    pub selected_worker_index: usize,
    pub selected_attack_index: usize,

    // Sorting (Workers view)
    pub sort_column: WorkerSortColumn,
    pub sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, std::time::Instant)>,
}

impl App {
    /// Create a new App with the given data source.
    pub fn new(source: Box<dyn DataSource>) -> Self {
        Self {
            running: true,
            current_view: View::Overview,
            show_help: false,
            show_detail_overlay: false,
            source,
            stats: None,
            history: History::new(),
            connection: ConnectionStatus::Connecting,
            last_update: None,
            selected_worker_index: 0,
            selected_attack_index: 0,
            sort_column: WorkerSortColumn::default(),
            sort_ascending: true,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, std::time::Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < std::time::Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Poll the data source and rebuild statistics from the snapshot.
    ///
    /// One refresh cycle: fetch, aggregate, derive. Returns Ok(true) if a
    /// new snapshot was received, Ok(false) if nothing changed.
    pub fn reload_data(&mut self) -> Result<bool> {
        let Some(snapshot) = self.source.poll() else {
            // No new data; a source error still flips the indicator (the
            // file source reports failures without delivering anything).
            if let Some(reason) = self.source.error() {
                self.connection = ConnectionStatus::Disconnected { reason };
            }
            return Ok(false);
        };

        let mut stats = analyze(&snapshot);
        calculate_metrics(&mut stats);

        // An HTTP cycle that failed delivers an empty snapshot and leaves
        // its error in the slot: zeroed statistics, red indicator.
        self.connection = match self.source.error() {
            Some(reason) => ConnectionStatus::Disconnected { reason },
            None => ConnectionStatus::Connected {
                logs: stats.total_logs,
            },
        };

        self.history.record(&stats);
        self.stats = Some(stats);
        self.last_update = Some(std::time::Instant::now());

        // Clamp selection indices to the new data
        self.selected_worker_index =
            self.selected_worker_index.min(self.filtered_worker_count().saturating_sub(1));
        self.selected_attack_index =
            self.selected_attack_index.min(self.filtered_attack_count().saturating_sub(1));

        Ok(true)
    }

    /// Switch to the next view (cycles Overview → Workers → Attacks).
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Workers => {
                let max = self.filtered_worker_count().saturating_sub(1);
                self.selected_worker_index = (self.selected_worker_index + n).min(max);
            }
            View::Attacks => {
                let max = self.filtered_attack_count().saturating_sub(1);
                self.selected_attack_index = (self.selected_attack_index + n).min(max);
            }
            View::Overview => {}
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Workers => {
                self.selected_worker_index = self.selected_worker_index.saturating_sub(n);
            }
            View::Attacks => {
                self.selected_attack_index = self.selected_attack_index.saturating_sub(n);
            }
            View::Overview => {}
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        match self.current_view {
            View::Workers => self.selected_worker_index = 0,
            View::Attacks => self.selected_attack_index = 0,
            View::Overview => {}
        }
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        match self.current_view {
            View::Workers => {
                self.selected_worker_index = self.filtered_worker_count().saturating_sub(1);
            }
            View::Attacks => {
                self.selected_attack_index = self.filtered_attack_count().saturating_sub(1);
            }
            View::Overview => {}
        }
    }

    /// Count of workers after applying the filter.
    pub fn filtered_worker_count(&self) -> usize {
        let Some(ref stats) = self.stats else {
            return 0;
        };
        stats.workers.keys().filter(|name| self.matches_filter(name)).count()
    }

    /// Count of recent attacks after applying the filter.
    pub fn filtered_attack_count(&self) -> usize {
        let Some(ref stats) = self.stats else {
            return 0;
        };
        if self.filter_text.is_empty() {
            return stats.recent_attacks.len();
        }
        stats.recent_attacks.iter().filter(|a| self.attack_matches_filter(a)).count()
    }

    /// Resolve the currently selected worker through sorting/filtering.
    ///
    /// The Workers view sorts and filters its rows, so the visual row
    /// index differs from the map's key order.
    pub fn get_selected_worker(&self) -> Option<(&str, &WorkerStats)> {
        let stats = self.stats.as_ref()?;

        let mut workers: Vec<(&str, &WorkerStats)> = stats
            .workers
            .iter()
            .map(|(name, w)| (name.as_str(), w))
            .filter(|(name, _)| self.matches_filter(name))
            .collect();
        crate::ui::workers::sort_workers_by(&mut workers, self.sort_column, self.sort_ascending);

        workers.get(self.selected_worker_index).copied()
    }

    /// Open the detail overlay for the currently selected worker.
    pub fn enter_detail(&mut self) {
        if self.current_view == View::Workers && self.get_selected_worker().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close overlays first, then return to Overview.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if self.current_view != View::Overview {
            self.current_view = View::Overview;
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column (Workers view).
    pub fn cycle_sort(&mut self) {
        if self.current_view == View::Workers {
            self.sort_column = self.sort_column.next();
        }
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        if self.current_view == View::Workers {
            self.sort_ascending = !self.sort_ascending;
        }
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a worker name matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Check if a recent attack matches the current filter.
    pub fn attack_matches_filter(&self, attack: &crate::data::RecentAttack) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let search = self.filter_text.to_lowercase();
        attack.attack_type.to_lowercase().contains(&search)
            || attack.worker.to_lowercase().contains(&search)
            || attack.description.to_lowercase().contains(&search)
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current statistics to a file.
    pub fn export_state(&self, path: &std::path::Path) -> Result<()> {
        use std::io::Write;

        let Some(ref stats) = self.stats else {
            anyhow::bail!("No data to export");
        };

        let json = serde_json::to_string_pretty(&export_json(stats))?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}

/// Build the export document for a statistics record.
///
/// Shared by the in-app export binding and the `--export` CLI mode.
pub fn export_json(stats: &DashboardStats) -> serde_json::Value {
    let mut export = serde_json::Map::new();

    // Summary
    let mut summary = serde_json::Map::new();
    summary.insert("total_logs".to_string(), serde_json::json!(stats.total_logs));
    summary.insert(
        "total_attacks".to_string(),
        serde_json::json!(stats.total_attacks),
    );
    summary.insert(
        "logs_per_second".to_string(),
        serde_json::json!(stats.logs_per_second),
    );
    summary.insert(
        "detection_rate".to_string(),
        serde_json::json!(stats.detection_rate),
    );
    summary.insert(
        "pending_logs".to_string(),
        serde_json::json!(stats.pending_logs()),
    );
    export.insert("summary".to_string(), serde_json::Value::Object(summary));

    // Attack-type buckets
    let mut attack_types = serde_json::Map::new();
    for (kind, count) in &stats.attack_types {
        attack_types.insert(kind.label().to_string(), serde_json::json!(count));
    }
    export.insert(
        "attack_types".to_string(),
        serde_json::Value::Object(attack_types),
    );

    // Workers
    let workers: Vec<serde_json::Value> = stats
        .workers
        .iter()
        .map(|(name, w)| {
            serde_json::json!({
                "name": name,
                "logs": w.logs,
                "attacks": w.attacks,
                "avg_processing_time_ms": w.avg_processing_time(),
                "last_heartbeat": w.last_heartbeat,
            })
        })
        .collect();
    export.insert("workers".to_string(), serde_json::Value::Array(workers));

    // Recent attacks
    let recent: Vec<serde_json::Value> = stats
        .recent_attacks
        .iter()
        .map(|a| {
            serde_json::json!({
                "type": a.attack_type,
                "description": a.description,
                "worker": a.worker,
                "confidence": a.confidence,
                "is_correct": a.is_correct,
                "processing_time_ms": a.processing_time,
                "observed_at": a.observed_at.map(|t| t.to_rfc3339()),
            })
        })
        .collect();
    export.insert("recent_attacks".to_string(), serde_json::Value::Array(recent));

    serde_json::Value::Object(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ChannelSource, LogEntry, RawLog};

    fn attack_entry(label: &str, worker: &str) -> LogEntry {
        LogEntry {
            log: Some(RawLog::default()),
            prediction: Some(label.to_string()),
            worker: Some(worker.to_string()),
            ..LogEntry::default()
        }
    }

    fn app_with_entries(entries: Vec<LogEntry>) -> App {
        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source));
        tx.send(entries).unwrap();
        // First poll returns the initial empty value, second the payload.
        let _ = app.reload_data();
        let _ = app.reload_data();
        app
    }

    #[test]
    fn test_reload_updates_connection_status() {
        let app = app_with_entries(vec![attack_entry("SQLi", "http://127.0.0.1:1/")]);
        assert_eq!(
            app.connection,
            ConnectionStatus::Connected { logs: 1 }
        );
        assert!(app.connection.is_connected());
    }

    #[test]
    fn test_view_cycling_round_trips() {
        let mut view = View::Overview;
        for _ in 0..3 {
            view = view.next();
        }
        assert_eq!(view, View::Overview);
        assert_eq!(View::Overview.prev(), View::Attacks);
    }

    #[test]
    fn test_selection_clamped_to_filtered_rows() {
        let mut app = app_with_entries(vec![
            attack_entry("SQLi", "http://127.0.0.1:1/"),
            attack_entry("XSS", "https://gpu-node.example.com/x"),
        ]);
        app.set_view(View::Workers);

        app.select_next_n(100);
        assert_eq!(app.selected_worker_index, 1);

        app.filter_text = "local".to_string();
        assert_eq!(app.filtered_worker_count(), 1);
    }

    #[test]
    fn test_get_selected_worker_respects_sort() {
        let mut app = app_with_entries(vec![
            attack_entry("Normal", "http://127.0.0.1:1/"),
            attack_entry("Normal", "http://127.0.0.1:1/"),
            attack_entry("Normal", "https://gpu-node.example.com/x"),
        ]);
        app.set_view(View::Workers);

        // Ascending by name: "Worker Local" sorts after "gpu-node".
        let (first, _) = app.get_selected_worker().unwrap();
        assert_eq!(first, "Worker Local");

        app.select_next();
        let (second, _) = app.get_selected_worker().unwrap();
        assert_eq!(second, "gpu-node");
    }

    #[test]
    fn test_attack_filter_matches_type_and_worker() {
        let mut app = app_with_entries(vec![
            attack_entry("SQLi", "http://127.0.0.1:1/"),
            attack_entry("XSS", "https://gpu-node.example.com/x"),
        ]);
        app.set_view(View::Attacks);

        app.filter_text = "sqli".to_string();
        assert_eq!(app.filtered_attack_count(), 1);

        app.filter_text = "gpu-node".to_string();
        assert_eq!(app.filtered_attack_count(), 1);

        app.filter_text = "nothing".to_string();
        assert_eq!(app.filtered_attack_count(), 0);
    }

    #[test]
    fn test_go_back_closes_overlay_before_switching_view() {
        let mut app = app_with_entries(vec![attack_entry("SQLi", "http://127.0.0.1:1/")]);
        app.set_view(View::Workers);
        app.enter_detail();
        assert!(app.show_detail_overlay);

        app.go_back();
        assert!(!app.show_detail_overlay);
        assert_eq!(app.current_view, View::Workers);

        app.go_back();
        assert_eq!(app.current_view, View::Overview);
    }

    #[test]
    fn test_export_json_shape() {
        let app = app_with_entries(vec![attack_entry("SQLi", "http://127.0.0.1:1/")]);
        let json = export_json(app.stats.as_ref().unwrap());

        assert_eq!(json["summary"]["total_logs"], 1);
        assert_eq!(json["summary"]["total_attacks"], 1);
        assert_eq!(json["attack_types"]["SQLi"], 1);
        assert_eq!(json["workers"][0]["name"], "Worker Local");
        assert_eq!(json["recent_attacks"][0]["type"], "SQLi");
    }

    #[test]
    fn test_export_without_data_fails() {
        let (_tx, source) = ChannelSource::create("test");
        let app = App::new(Box::new(source));
        assert!(app.export_state(std::path::Path::new("/tmp/attackwatch-test.json")).is_err());
    }
}
