//! Live view rendering.
//!
//! Two cards: the temperature reading as large text and the humidity as a
//! gauge, each with a sparkline of recent values.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use serde_json::Value;

use crate::app::App;
use crate::data::Series;
use crate::ui::common::spinner;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_temperature(frame, app, cards[0]);
    render_humidity(frame, app, cards[1]);
}

fn card<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_temperature(frame: &mut Frame, app: &App, area: Rect) {
    let block = card(app, " Temperature ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1), // Value
        Constraint::Min(1),
        Constraint::Length(1), // Sparkline
    ])
    .split(inner);

    let value = match app.feed.temperature() {
        Some(value) => Span::styled(
            format!("{} °C", display_value(value)),
            Style::default()
                .fg(app.theme.temperature)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::raw(format!("{} loading", spinner(app.tick))),
    };
    frame.render_widget(Paragraph::new(Line::from(value)).alignment(Alignment::Center), rows[1]);

    let trend = trend_text(&app.feed.history().temperature, rows[3].width);
    frame.render_widget(
        Paragraph::new(trend)
            .style(Style::default().fg(app.theme.temperature))
            .alignment(Alignment::Center),
        rows[3],
    );
}

fn render_humidity(frame: &mut Frame, app: &App, area: Rect) {
    let block = card(app, " Humidity ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1), // Gauge
        Constraint::Min(1),
        Constraint::Length(1), // Sparkline
    ])
    .split(inner);

    match app.feed.humidity() {
        Some(value) => {
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(app.theme.humidity))
                .ratio(gauge_ratio(value))
                .label(format!("{} %", display_value(value)));
            frame.render_widget(gauge, rows[1]);
        }
        None => {
            let loading = Paragraph::new(format!("{} loading", spinner(app.tick)))
                .alignment(Alignment::Center);
            frame.render_widget(loading, rows[1]);
        }
    }

    let trend = trend_text(&app.feed.history().humidity, rows[3].width);
    frame.render_widget(
        Paragraph::new(trend)
            .style(Style::default().fg(app.theme.humidity))
            .alignment(Alignment::Center),
        rows[3],
    );
}

/// Text of a delivered value, shown as-is.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fill ratio for a humidity percentage. Non-numeric values draw empty.
pub fn gauge_ratio(value: &Value) -> f64 {
    let percent = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    percent
        .filter(|p| p.is_finite())
        .map(|p| p.clamp(0.0, 100.0) / 100.0)
        .unwrap_or(0.0)
}

/// Sparkline plus the latest rate of change, when there is one.
fn trend_text(series: &Series, width: u16) -> String {
    match series.rate_per_minute() {
        Some(rate) => {
            let rate = format!(" {:+.1}/min", rate);
            let spark_width = (width as usize).saturating_sub(rate.chars().count());
            format!("{}{}", sparkline_line(series, spark_width as u16), rate)
        }
        None => sparkline_line(series, width),
    }
}

fn sparkline_line(series: &Series, width: u16) -> String {
    let levels = series.sparkline();
    let width = width as usize;
    let start = levels.len().saturating_sub(width);
    levels[start..]
        .iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect()
}
