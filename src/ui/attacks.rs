//! Recent-attacks view rendering.
//!
//! Displays the feed of recent attack summaries with confidence-tier
//! coloring and ground-truth markers.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::{AttackType, RecentAttack};

/// Maximum description length shown in the feed.
const MAX_DESCRIPTION_LEN: usize = 80;

/// Render the Attacks view as a table of recent attack summaries.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(ref stats) = app.stats else {
        return;
    };

    if stats.recent_attacks.is_empty() {
        render_quiet_message(frame, app, area);
        return;
    }

    // Filter by search text
    let attacks: Vec<&RecentAttack> =
        stats.recent_attacks.iter().filter(|a| app.attack_matches_filter(a)).collect();

    let header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("Type"),
        Cell::from("Worker"),
        Cell::from("Conf"),
        Cell::from("OK"),
        Cell::from("ms"),
        Cell::from("Description"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = attacks
        .iter()
        .map(|a| {
            let time = a
                .observed_at
                .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());

            // Known categories get their short badge; anything else shows
            // its raw label.
            let type_label = AttackType::from_label(&a.attack_type)
                .map(|t| t.short_label().to_string())
                .unwrap_or_else(|| a.attack_type.clone());

            let confidence_style = app.theme.confidence_style(a.confidence_tier());

            let (verdict, verdict_style) = match a.is_correct {
                Some(true) => ("✓", Style::default().fg(app.theme.healthy)),
                Some(false) => ("✗", Style::default().fg(app.theme.critical)),
                None => ("-", Style::default().add_modifier(Modifier::DIM)),
            };

            Row::new(vec![
                Cell::from(time).style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(type_label)
                    .style(Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)),
                Cell::from(a.worker.clone()),
                Cell::from(format!("{:.0}%", a.confidence * 100.0)).style(confidence_style),
                Cell::from(verdict).style(verdict_style),
                Cell::from(
                    a.processing_time
                        .map(|t| format!("{:.0}", t))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(sanitize_description(&a.description)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(9),  // Time - fixed
        Constraint::Length(9),  // Type - fixed
        Constraint::Fill(1),    // Worker
        Constraint::Length(5),  // Conf - fixed
        Constraint::Length(3),  // OK - fixed
        Constraint::Length(6),  // ms - fixed
        Constraint::Fill(4),    // Description - 4x share (usually longest)
    ];

    let selected_visual_index = app.selected_attack_index.min(attacks.len().saturating_sub(1));

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let position_info = if !attacks.is_empty() {
        format!(" [{}/{}]", selected_visual_index + 1, attacks.len())
    } else {
        String::new()
    };

    let title = format!(
        " Recent Attacks ({}/{}){}{} ",
        attacks.len(),
        stats.total_attacks,
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
                .border_style(Style::default().fg(app.theme.critical)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected_visual_index));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_quiet_message(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Recent Attacks ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.healthy));

    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled("    ✓ ", Style::default().fg(app.theme.healthy)),
            Span::styled(
                "No attacks detected",
                Style::default().fg(app.theme.healthy).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "      All processed logs classified as normal traffic.",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Prepare an attack description for a table cell.
///
/// Payloads are attacker-controlled: control characters are replaced so
/// they cannot garble the terminal, and long descriptions are truncated.
pub fn sanitize_description(raw: &str) -> String {
    let cleaned: String =
        raw.chars().map(|c| if c.is_control() { ' ' } else { c }).collect();

    if cleaned.chars().count() <= MAX_DESCRIPTION_LEN {
        cleaned
    } else {
        let truncated: String = cleaned.chars().take(MAX_DESCRIPTION_LEN).collect();
        format!("{}...", truncated)
    }
}
