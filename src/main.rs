use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
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
use tokio::runtime::Runtime;
use tracing::{info, warn};

use rtc_monitor::app::{App, View};
use rtc_monitor::export::HistoryExport;
use rtc_monitor::logging::{self, LogTarget};
use rtc_monitor::ui::{self, Theme};
use rtc_monitor::{
    events, Database, FileReplay, FilterMode, FirebaseDatabase, HistoricalGraph, MonitorConfig,
};

#[derive(Parser, Debug)]
#[command(name = "rtc-monitor")]
#[command(about = "Terminal dashboard for live and historical temperature/humidity readings")]
struct Args {
    /// Replay a JSON export of the database instead of connecting
    #[arg(short, long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL, overrides the configured one
    #[arg(short, long)]
    url: Option<String>,

    /// Initial history granularity (daily or monthly)
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = FilterMode::Daily)]
    mode: FilterMode,

    /// Initial history date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Refresh interval in seconds (only used with --file)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    refresh: Option<u64>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export the history chart points to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Seconds to wait for history data when exporting
    #[arg(long, default_value = "10")]
    timeout: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MonitorConfig::load(args.config.as_deref())?;
    if let Some(ref url) = args.url {
        config.database.database_url = url.clone();
    }

    let log_target = if args.export.is_some() {
        LogTarget::Stderr
    } else if let Some(ref path) = args.log_file {
        LogTarget::File(path.clone())
    } else {
        LogTarget::Discard
    };
    logging::init(&config.log_level, log_target)?;

    // Streams and file polling run on the runtime while the UI loop stays
    // on the main thread
    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let db: Arc<dyn Database> = match args.file {
        Some(ref path) => {
            let refresh = Duration::from_secs(args.refresh.unwrap_or(config.refresh_secs));
            Arc::new(spawn_file_replay(path, refresh))
        }
        None => Arc::new(
            FirebaseDatabase::from_config(&config.database)
                .context("Failed to create database client")?,
        ),
    };
    info!(source = db.description(), "Database ready");

    let date = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_to_file(db, args.mode, date, export_path, Duration::from_secs(args.timeout));
    }

    run_tui(db, args.mode, date)
}

/// Load the export once, then keep polling it for changes in the background.
///
/// Must be called inside the runtime. A zero `refresh_secs` from the config
/// is raised to the replay's minimum interval.
fn spawn_file_replay(path: &Path, refresh: Duration) -> rtc_monitor::MemoryDatabase {
    let mut replay = FileReplay::new(path);
    replay.poll();
    if let Some(err) = replay.error() {
        warn!(error = err, "Initial file load failed");
    }
    let database = replay.database().clone();
    replay.spawn(refresh);
    database
}

/// Run the TUI against the given database
fn run_tui(db: Arc<dyn Database>, mode: FilterMode, date: NaiveDate) -> Result<()> {
    // Detect the theme before raw mode; the query reads from the terminal
    let theme = Theme::auto_detect();

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
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    // Create app and mount the components
    let mut app = App::new(db, mode, date, theme);

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    app.shutdown();

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

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.poll_data();

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
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5.min(area.height));
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

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Live => ui::live::render(frame, app, chunks[2]),
                View::History => ui::charts::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Wait for the first history snapshot and write its chart points to a file
fn export_to_file(
    db: Arc<dyn Database>,
    mode: FilterMode,
    date: NaiveDate,
    export_path: &Path,
    timeout: Duration,
) -> Result<()> {
    let mut graph = HistoricalGraph::new(db, mode, date);
    let started = Instant::now();

    loop {
        graph.poll();
        if graph.loaded() {
            break;
        }
        if let Some(err) = graph.error() {
            bail!("Failed to load {}: {}", graph.path(), err);
        }
        if started.elapsed() >= timeout {
            bail!("Timed out after {:?} waiting for {}", timeout, graph.path());
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    HistoryExport::from_graph(&graph).write_to(export_path)?;
    println!(
        "Exported {} points for {} to: {}",
        graph.points().len(),
        graph.path(),
        export_path.display()
    );
    graph.unmount();
    Ok(())
}
