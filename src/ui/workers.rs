//! Workers view rendering.
//!
//! Displays a sortable table of per-worker statistics: logs processed,
//! attacks detected, average processing time, load share, and heartbeat.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::stats::parse_timestamp;
use crate::data::WorkerStats;

/// Column to sort by in the Workers view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerSortColumn {
    /// Sort by worker display name alphabetically.
    #[default]
    Name,
    /// Sort by processed log count.
    Logs,
    /// Sort by detected attack count.
    Attacks,
    /// Sort by average processing time.
    AvgTime,
    /// Sort by last-heartbeat timestamp.
    Heartbeat,
}

impl WorkerSortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            WorkerSortColumn::Name => WorkerSortColumn::Logs,
            WorkerSortColumn::Logs => WorkerSortColumn::Attacks,
            WorkerSortColumn::Attacks => WorkerSortColumn::AvgTime,
            WorkerSortColumn::AvgTime => WorkerSortColumn::Heartbeat,
            WorkerSortColumn::Heartbeat => WorkerSortColumn::Name,
        }
    }
}

/// Render the Workers view showing all workers in a sortable table.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref stats) = app.stats else {
        return;
    };

    if stats.workers.is_empty() {
        render_empty_message(frame, app, area);
        return;
    }

    // Get filtered and sorted worker rows
    let mut workers: Vec<(&str, &WorkerStats)> = stats
        .workers
        .iter()
        .map(|(name, w)| (name.as_str(), w))
        .filter(|(name, _)| app.matches_filter(name))
        .collect();
    sort_workers_by(&mut workers, app.sort_column, app.sort_ascending);

    let header = Row::new(vec![
        Cell::from(format_header("Worker", WorkerSortColumn::Name, app)),
        Cell::from(format_header("Logs", WorkerSortColumn::Logs, app)),
        Cell::from(format_header("Attacks", WorkerSortColumn::Attacks, app)),
        Cell::from(format_header("Avg Time", WorkerSortColumn::AvgTime, app)),
        Cell::from("Load"),
        Cell::from(format_header("Heartbeat", WorkerSortColumn::Heartbeat, app)),
        Cell::from("Status"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = workers
        .iter()
        .map(|(name, w)| {
            let attack_style = if w.attacks > 0 {
                Style::default().fg(app.theme.critical)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };

            let load = if stats.total_logs > 0 {
                format!("{:.1}%", w.logs as f64 / stats.total_logs as f64 * 100.0)
            } else {
                "-".to_string()
            };

            let (status_symbol, status_style) = if w.is_online() {
                ("●", Style::default().fg(app.theme.healthy))
            } else {
                ("○", Style::default().add_modifier(Modifier::DIM))
            };

            Row::new(vec![
                Cell::from(name.to_string()),
                Cell::from(format_count(w.logs)),
                Cell::from(if w.attacks > 0 {
                    format_count(w.attacks)
                } else {
                    "-".to_string()
                })
                .style(attack_style),
                Cell::from(
                    w.avg_processing_time()
                        .map(|t| format!("{:.0}ms", t))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(load),
                Cell::from(format_heartbeat(&w.last_heartbeat)),
                Cell::from(status_symbol).style(status_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),    // Worker - gets 3x share (largest)
        Constraint::Fill(1),    // Logs
        Constraint::Fill(1),    // Attacks
        Constraint::Fill(1),    // Avg Time
        Constraint::Fill(1),    // Load
        Constraint::Min(10),    // Heartbeat
        Constraint::Min(6),     // Status
    ];

    let selected_visual_index = app.selected_worker_index.min(workers.len().saturating_sub(1));

    let sort_indicator = match app.sort_column {
        WorkerSortColumn::Name => "name",
        WorkerSortColumn::Logs => "logs",
        WorkerSortColumn::Attacks => "attacks",
        WorkerSortColumn::AvgTime => "time",
        WorkerSortColumn::Heartbeat => "heartbeat",
    };
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    // Build title with filter info
    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    // Show scroll position if there are items
    let position_info = if !workers.is_empty() {
        format!(" [{}/{}]", selected_visual_index + 1, workers.len())
    } else {
        String::new()
    };

    let title = format!(
        " Workers ({}/{}) [s:sort {}{}]{}{} ",
        workers.len(),
        stats.workers.len(),
        sort_indicator,
        sort_dir,
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected_visual_index));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_empty_message(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Workers ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let lines = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "  No workers have processed logs yet.",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn format_header(name: &str, col: WorkerSortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Sort worker rows by the given column and direction (public for use in app.rs)
pub fn sort_workers_by(
    workers: &mut [(&str, &WorkerStats)],
    column: WorkerSortColumn,
    ascending: bool,
) {
    workers.sort_by(|a, b| {
        let primary = match column {
            WorkerSortColumn::Name => a.0.cmp(b.0),
            WorkerSortColumn::Logs => a.1.logs.cmp(&b.1.logs),
            WorkerSortColumn::Attacks => a.1.attacks.cmp(&b.1.attacks),
            WorkerSortColumn::AvgTime => {
                let a_time = a.1.avg_processing_time().unwrap_or(0.0);
                let b_time = b.1.avg_processing_time().unwrap_or(0.0);
                a_time.partial_cmp(&b_time).unwrap_or(std::cmp::Ordering::Equal)
            }
            WorkerSortColumn::Heartbeat => a.1.last_heartbeat.cmp(&b.1.last_heartbeat),
        };

        // Apply direction to primary comparison
        let primary = if ascending {
            primary
        } else {
            primary.reverse()
        };

        // Use secondary sort by name for stability when primary values are equal
        if primary == std::cmp::Ordering::Equal {
            a.0.cmp(b.0)
        } else {
            primary
        }
    });
}

/// Format a raw heartbeat timestamp as local wall-clock time.
pub fn format_heartbeat(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Format large numbers with K/M suffixes
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(logs: u64, attacks: u64, avg_ms: f64) -> WorkerStats {
        WorkerStats {
            logs,
            attacks,
            processing_times: if avg_ms > 0.0 { vec![avg_ms] } else { Vec::new() },
            last_heartbeat: String::new(),
        }
    }

    #[test]
    fn test_sort_by_name_is_case_sensitive() {
        let a = worker(1, 0, 0.0);
        let b = worker(2, 0, 0.0);
        let mut rows = vec![("gpu-node", &a), ("Worker Local", &b)];

        sort_workers_by(&mut rows, WorkerSortColumn::Name, true);
        assert_eq!(rows[0].0, "Worker Local");

        sort_workers_by(&mut rows, WorkerSortColumn::Name, false);
        assert_eq!(rows[0].0, "gpu-node");
    }

    #[test]
    fn test_sort_by_logs_descending() {
        let a = worker(5, 0, 0.0);
        let b = worker(20, 0, 0.0);
        let mut rows = vec![("a", &a), ("b", &b)];

        sort_workers_by(&mut rows, WorkerSortColumn::Logs, false);
        assert_eq!(rows[0].0, "b");
    }

    #[test]
    fn test_sort_ties_fall_back_to_name() {
        let a = worker(5, 0, 0.0);
        let b = worker(5, 0, 0.0);
        let mut rows = vec![("zeta", &a), ("alpha", &b)];

        sort_workers_by(&mut rows, WorkerSortColumn::Logs, true);
        assert_eq!(rows[0].0, "alpha");
    }

    #[test]
    fn test_sort_by_avg_time_treats_missing_as_zero() {
        let fast = worker(1, 0, 10.0);
        let slow = worker(1, 0, 200.0);
        let none = worker(1, 0, 0.0);
        let mut rows = vec![("slow", &slow), ("none", &none), ("fast", &fast)];

        sort_workers_by(&mut rows, WorkerSortColumn::AvgTime, true);
        assert_eq!(rows[0].0, "none");
        assert_eq!(rows[2].0, "slow");
    }

    #[test]
    fn test_format_heartbeat() {
        assert_eq!(format_heartbeat("garbage"), "-");
        assert_eq!(format_heartbeat(""), "-");
        assert_ne!(format_heartbeat("2025-11-02T10:00:00+00:00"), "-");
    }
}
