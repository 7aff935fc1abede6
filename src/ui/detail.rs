//! Detail overlay rendering.
//!
//! Displays a modal overlay with detailed information about a selected worker.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::workers::format_heartbeat;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 14;

/// Render the worker detail as a modal overlay.
///
/// Shows the selected worker's counters, load share, heartbeat, and its
/// processing-time distribution.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(ref stats) = app.stats else {
        return;
    };
    let Some((name, worker)) = app.get_selected_worker() else {
        return;
    };

    // Calculate overlay size
    let overlay_width = (area.width * 80 / 100).clamp(MIN_OVERLAY_WIDTH, 90);
    let overlay_height = (area.height * 70 / 100).clamp(MIN_OVERLAY_HEIGHT, 24);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(5), // Header with worker counters
        Constraint::Min(6),    // Processing-time distribution
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    // ===== HEADER SECTION =====
    let (status_symbol, status_style) = if worker.is_online() {
        ("● Online", Style::default().fg(app.theme.healthy))
    } else {
        ("○ Idle", Style::default().add_modifier(Modifier::DIM))
    };

    let load_share = if stats.total_logs > 0 {
        format!("{:.1}%", worker.logs as f64 / stats.total_logs as f64 * 100.0)
    } else {
        "-".to_string()
    };

    let header_lines = vec![
        Line::from(vec![Span::styled(
            format!(" {} ", name),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" Logs: "),
            Span::styled(
                format!("{}", worker.logs),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("    Attacks: "),
            Span::styled(
                format!("{}", worker.attacks),
                if worker.attacks > 0 {
                    Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                },
            ),
            Span::raw("    Load: "),
            Span::styled(load_share, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled(status_symbol, status_style),
        ]),
    ];

    let header_block = Block::default()
        .title(" Worker Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Paragraph::new(header_lines).block(header_block), chunks[0]);

    // ===== PROCESSING TIMES =====
    let times_block = Block::default()
        .title(format!(" Processing Times ({} samples) ", worker.processing_times.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let times_lines = if worker.processing_times.is_empty() {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No processing times reported yet",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ]
    } else {
        let min = worker.processing_times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = worker.processing_times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg = worker.avg_processing_time().unwrap_or(0.0);

        vec![
            Line::from(""),
            Line::from(vec![
                Span::raw(" Avg: "),
                Span::styled(
                    format!("{:.1} ms", avg),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("    Min: "),
                Span::styled(format!("{:.1} ms", min), Style::default()),
                Span::raw("    Max: "),
                Span::styled(format!("{:.1} ms", max), Style::default()),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::raw(" Trend: "),
                Span::styled(
                    times_sparkline(&worker.processing_times),
                    Style::default().fg(app.theme.highlight),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::raw(" Last heartbeat: "),
                Span::styled(
                    format_heartbeat(&worker.last_heartbeat),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
        ]
    };

    frame.render_widget(Paragraph::new(times_lines).block(times_block), chunks[1]);

    // ===== FOOTER =====
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}

/// Render a dispatch-order sparkline of the most recent processing times.
fn times_sparkline(times: &[f64]) -> String {
    if times.is_empty() {
        return String::new();
    }

    // Take last 32 values
    let recent: Vec<f64> = times.iter().rev().take(32).rev().copied().collect();

    let max = recent.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = recent.iter().cloned().fold(f64::INFINITY, f64::min);
    let range = (max - min).max(f64::EPSILON);

    recent
        .iter()
        .map(|&v| {
            let level = (((v - min) / range) * 7.0) as usize;
            SPARKLINE_CHARS[level.min(7)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_sparkline_empty() {
        assert_eq!(times_sparkline(&[]), "");
    }

    #[test]
    fn test_times_sparkline_spans_levels() {
        let out = times_sparkline(&[0.0, 100.0]);
        assert_eq!(out, "▁█");
    }

    #[test]
    fn test_times_sparkline_flat_series() {
        // Constant times must not divide by zero
        let out = times_sparkline(&[50.0, 50.0, 50.0]);
        assert_eq!(out.chars().count(), 3);
    }

    #[test]
    fn test_times_sparkline_caps_window() {
        let times: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_eq!(times_sparkline(&times).chars().count(), 32);
    }
}
