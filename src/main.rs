// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};

mod app;
mod config;
mod data;
mod events;
mod source;
mod ui;

use app::{App, View};
use config::Settings;
use source::{DataSource, FileSource, HttpSource};

#[derive(Parser, Debug)]
#[command(name = "attackwatch")]
#[command(about = "Diagnostic TUI for monitoring a distributed attack-detection pipeline")]
struct Args {
    /// Base URL of the master aggregation service
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,

    /// Read log-history snapshots from a JSON file instead of the master
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refresh interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Export current statistics to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref())?;
    let url = args.url.clone().unwrap_or(settings.master_url);
    let refresh = Duration::from_secs(args.refresh.unwrap_or(settings.refresh_secs));

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_once(args.file.as_deref(), &url, export_path);
    }

    match args.file {
        Some(ref path) => run_with_file(path, refresh),
        None => run_with_http(&url, refresh),
    }
}

/// Install a tracing subscriber on stderr.
///
/// Quiet unless RUST_LOG is set; the TUI owns stdout.
fn init_tracing() {
    if let Ok(filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
    }
}

/// Run with a file-based data source
fn run_with_file(path: &PathBuf, refresh: Duration) -> Result<()> {
    let source = Box::new(FileSource::new(path));
    run_tui(source, refresh)
}

/// Run with the HTTP polling data source
fn run_with_http(url: &str, refresh: Duration) -> Result<()> {
    // Build a tokio runtime for the background fetch task
    let rt = tokio::runtime::Runtime::new()?;

    let source = {
        let _guard = rt.enter();
        HttpSource::spawn(url, refresh)
    };

    // The polling task owns the fetch cadence; the TUI loop just drains
    // its channel, so it polls faster than the refresh interval.
    run_tui(Box::new(source), Duration::from_millis(250))
}

/// Run the TUI with the given data source
fn run_tui(source: Box<dyn DataSource>, refresh_interval: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Create app and run the first refresh cycle immediately
    let mut app = App::new(source);
    let _ = app.reload_data();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, refresh_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(0, area.height / 2 - 2, area.width, 5);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            // Render header with connection status and totals
            ui::common::render_header(frame, app, chunks[0]);

            // Render tabs
            ui::common::render_tabs(frame, app, chunks[1]);

            // Render current view
            match app.current_view {
                View::Overview => ui::overview::render(frame, app, chunks[2]),
                View::Workers => ui::workers::render(frame, app, chunks[2]),
                View::Attacks => ui::attacks::render(frame, app, chunks[2]),
            }

            // Render status bar
            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render detail overlay if active
            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1) + table header (1)
                    events::handle_mouse_event(app, mouse, 3);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Auto-refresh data periodically
        if last_refresh.elapsed() >= refresh_interval {
            let _ = app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Run one fetch-aggregate cycle and write the statistics to a JSON file
fn export_once(
    file: Option<&std::path::Path>,
    url: &str,
    export_path: &std::path::Path,
) -> Result<()> {
    use std::io::Write;

    let history = match file {
        Some(path) => {
            let mut source = FileSource::new(path);
            let history = source.poll().unwrap_or_default();
            if let Some(err) = source.error() {
                anyhow::bail!("failed to read {}: {}", path.display(), err);
            }
            history
        }
        None => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(source::fetch_once(url))?
        }
    };

    let mut stats = data::analyze(&history);
    data::calculate_metrics(&mut stats);

    let json = serde_json::to_string_pretty(&app::export_json(&stats))?;
    let mut out = std::fs::File::create(export_path)?;
    out.write_all(json.as_bytes())?;

    println!("Exported statistics to: {}", export_path.display());
    Ok(())
}
