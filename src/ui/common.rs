//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};

/// Spinner frames shown while waiting for the first value.
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Returns the spinner frame for a tick count.
pub fn spinner(tick: usize) -> char {
    SPINNER[(tick / 2) % SPINNER.len()]
}

/// Render the header bar with connection status.
///
/// Displays: status dot, source description, current history target.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let failed = app.error().is_some();
    let live = app.feed.last_update().is_some();
    let status_text = if failed {
        "error"
    } else if live {
        "live"
    } else {
        "connecting"
    };

    let line = Line::from(vec![
        Span::styled(
            " RTC MONITOR ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("| "),
        Span::styled("●", app.theme.connection_style(live, failed)),
        Span::raw(format!(" {} ", status_text)),
        Span::raw("| "),
        Span::styled(
            app.source_description().to_string(),
            Style::default().fg(app.theme.muted),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = [View::Live, View::History]
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!(" {}:{} ", i + 1, view.label())))
        .collect();

    let selected = match app.current_view {
        View::Live => 0,
        View::History => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: date prompt when active, otherwise time since last update and
/// available controls. Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if app.date_input_active {
        let prompt = format!(
            " Go to date (YYYY-MM-DD): {}_ | Enter:apply Esc:cancel",
            app.date_input
        );
        let paragraph = Paragraph::new(prompt).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(err) = app.error() {
        let paragraph = Paragraph::new(format!(" Error: {} | r:resubscribe q:quit", err))
            .style(Style::default().fg(app.theme.error));
        frame.render_widget(paragraph, area);
        return;
    }

    let last_update = match app.current_view {
        View::Live => app.feed.last_update(),
        View::History => app.graph.last_update(),
    };
    let updated = match last_update {
        Some(at) => format!("Updated {:.1}s ago", at.elapsed().as_secs_f64()),
        None => "Waiting for data".to_string(),
    };

    let controls = match app.current_view {
        View::Live => "Tab:switch ?:help q:quit",
        View::History => "←→:date d/m:mode g:go to t:today e:export ?:help q:quit",
    };

    let paragraph = Paragraph::new(format!(" {} | {}", updated, controls))
        .style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Views",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab         Switch views"),
        Line::from("  1 / 2       Live / History"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " History",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  d / m       Daily / monthly"),
        Line::from("  f           Toggle mode"),
        Line::from("  ←/→ h/l     Previous / next date"),
        Line::from("  t           Today"),
        Line::from("  g           Go to date"),
        Line::from("  e           Export to JSON"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r           Resubscribe"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
