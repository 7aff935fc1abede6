//! Overview view rendering.
//!
//! Main counters with trend sparklines, the attack-type distribution bars,
//! and the derived performance widgets.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::{App, ConnectionStatus};
use crate::data::{format_uptime, AttackType, DashboardStats};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the Overview view.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref stats) = app.stats else {
        render_waiting(frame, app, area);
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(4), // Counter cards
        Constraint::Min(7),    // Attack-type distribution
        Constraint::Length(6), // Performance widgets
    ])
    .split(area);

    render_counters(frame, app, stats, chunks[0]);
    render_attack_types(frame, app, stats, chunks[1]);
    render_performance(frame, app, stats, chunks[2]);
}

/// Visual share of one attack bucket.
///
/// Count over total, floored at 1% so a nonzero dashboard never renders
/// an invisible bar. Zero total means zero bars.
pub fn bar_ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64).max(0.01)
}

fn render_counters(frame: &mut Frame, app: &App, stats: &DashboardStats, area: Rect) {
    let chunks = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ])
    .split(area);

    counter_card(
        frame,
        app,
        chunks[0],
        "Total Logs",
        format_count(stats.total_logs),
        Style::default().add_modifier(Modifier::BOLD),
        Some(render_sparkline(&app.history.logs_sparkline())),
    );

    counter_card(
        frame,
        app,
        chunks[1],
        "Attacks",
        format_count(stats.total_attacks),
        if stats.total_attacks > 0 {
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        },
        Some(render_sparkline(&app.history.attacks_sparkline())),
    );

    // Live rate between the last two polls, when available; otherwise the
    // whole-window throughput.
    let rate = app
        .history
        .poll_rate()
        .map(|r| format!("{:.1}/s", r))
        .unwrap_or_else(|| format!("{:.1}/s", stats.logs_per_second));
    counter_card(
        frame,
        app,
        chunks[2],
        "Throughput",
        rate,
        Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
        None,
    );

    counter_card(
        frame,
        app,
        chunks[3],
        "Detection Rate",
        format!("{:.1}%", stats.detection_rate),
        Style::default().fg(app.theme.healthy).add_modifier(Modifier::BOLD),
        None,
    );
}

fn counter_card(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    value: String,
    value_style: Style,
    trend: Option<String>,
) {
    let mut line = vec![Span::styled(format!(" {}", value), value_style)];
    if let Some(trend) = trend {
        line.push(Span::raw("  "));
        line.push(Span::styled(trend, Style::default().add_modifier(Modifier::DIM)));
    }

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(vec![Line::from(""), Line::from(line)]).block(block), area);
}

fn render_attack_types(frame: &mut Frame, app: &App, stats: &DashboardStats, area: Rect) {
    let title = format!(
        " Attack Types ({}/{} bucketed) ",
        stats.bucketed_attacks(),
        stats.total_attacks
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([Constraint::Length(1); AttackType::ALL.len()]).split(inner);

    for (kind, row) in AttackType::ALL.iter().zip(rows.iter()) {
        let count = stats.attack_count(*kind);
        let percent = if stats.total_attacks > 0 {
            count as f64 / stats.total_attacks as f64 * 100.0
        } else {
            0.0
        };

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(app.theme.critical).bg(ratatui::style::Color::Reset))
            .ratio(bar_ratio(count, stats.total_attacks))
            .label(format!("{:<8} {:>4}  {:.1}%", kind.short_label(), count, percent));
        frame.render_widget(gauge, *row);
    }
}

fn render_performance(frame: &mut Frame, app: &App, stats: &DashboardStats, area: Rect) {
    let uptime = stats
        .uptime_since()
        .map(|since| format_uptime(since, Utc::now()))
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(vec![
            Span::raw(" Avg processing time: "),
            Span::styled(
                format!("{:.1} ms", stats.average_processing_time()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("    Load balance: "),
            Span::styled(
                format!("{:.1}%", stats.load_balance_efficiency()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw(" Uptime: "),
            Span::styled(uptime, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("    Pending: "),
            Span::styled(
                format_count(stats.pending_logs()),
                if stats.pending_logs() > 0 {
                    Style::default().fg(app.theme.warning)
                } else {
                    Style::default().add_modifier(Modifier::DIM)
                },
            ),
            Span::raw("    Workers: "),
            Span::styled(
                format!("{}", stats.workers.len()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let block = Block::default()
        .title(" Performance ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_waiting(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Overview ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let message = match &app.connection {
        ConnectionStatus::Disconnected { reason } => Line::from(vec![
            Span::styled("  ● ", Style::default().fg(app.theme.critical)),
            Span::styled(
                format!("Cannot reach the master: {}", reason),
                Style::default().fg(app.theme.critical),
            ),
        ]),
        _ => Line::from(vec![Span::styled(
            "  Waiting for the first snapshot...",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    };

    let paragraph = Paragraph::new(vec![Line::from(""), message]).block(block);
    frame.render_widget(paragraph, area);
}

fn render_sparkline(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }

    // Take last 8 values
    let values: Vec<u8> = data.iter().rev().take(8).rev().copied().collect();

    values.iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect()
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

    #[test]
    fn test_bar_ratio_floors_at_one_percent() {
        assert_eq!(bar_ratio(0, 10), 0.01);
        assert_eq!(bar_ratio(0, 0), 0.0);
        assert_eq!(bar_ratio(5, 10), 0.5);
        assert_eq!(bar_ratio(10, 10), 1.0);
    }

    #[test]
    fn test_sparkline_rendering() {
        assert_eq!(render_sparkline(&[]), "");
        assert_eq!(render_sparkline(&[0, 7]), "▁█");
        // Only the last 8 values are shown
        assert_eq!(render_sparkline(&[0, 0, 0, 0, 0, 7, 7, 7, 7, 7]).chars().count(), 8);
    }
}
