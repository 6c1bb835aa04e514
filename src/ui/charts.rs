//! History view rendering.
//!
//! A toolbar with the filter mode and date, then one line chart per
//! quantity. Both charts plot points by index, share the same x labels and
//! scale their y axes independently.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{ChartPoint, FilterMode};
use crate::ui::common::spinner;

/// Most x-axis labels drawn; the rest are skipped.
const MAX_X_LABELS: usize = 7;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Toolbar
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .split(area);

    render_toolbar(frame, app, chunks[0]);

    let points = app.graph.points();
    if !app.graph.loaded() || points.is_empty() {
        let message = if app.graph.loaded() {
            format!("No data for {}", app.graph.date_label())
        } else {
            format!("{} loading {}", spinner(app.tick), app.graph.path())
        };
        let placeholder = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(app.theme.border_type)
                    .border_style(Style::default().fg(app.theme.border)),
            );
        frame.render_widget(placeholder, chunks[1].union(chunks[2]));
        return;
    }

    let x_labels = x_labels(points);
    let temperature: Vec<(f64, f64)> = series(points, |p| p.temperature);
    let humidity: Vec<(f64, f64)> = series(points, |p| p.humidity);

    render_chart(
        frame,
        app,
        chunks[1],
        " Temperature (°C) ",
        &temperature,
        &x_labels,
        app.theme.temperature,
    );
    render_chart(
        frame,
        app,
        chunks[2],
        " Humidity (%) ",
        &humidity,
        &x_labels,
        app.theme.humidity,
    );
}

fn render_toolbar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_span = |mode: FilterMode| {
        if app.graph.mode() == mode {
            Span::styled(format!(" {} ", mode.label()), app.theme.tab_active)
        } else {
            Span::styled(format!(" {} ", mode.label()), app.theme.tab_inactive)
        }
    };

    let line = Line::from(vec![
        mode_span(FilterMode::Daily),
        Span::raw("|"),
        mode_span(FilterMode::Monthly),
        Span::raw("  ◀ "),
        Span::styled(
            app.graph.date_label(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ▶  "),
        Span::styled(
            format!("{} points", app.graph.points().len()),
            Style::default().fg(app.theme.muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_chart(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    data: &[(f64, f64)],
    x_labels: &[String],
    color: ratatui::style::Color,
) {
    let [y_min, y_max] = axis_bounds(data.iter().map(|(_, y)| *y));
    let x_max = data.len().saturating_sub(1).max(1) as f64;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data);

    let muted = Style::default().fg(app.theme.muted);
    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .x_axis(
            Axis::default()
                .title(app.graph.x_axis_title())
                .style(muted)
                .bounds([0.0, x_max])
                .labels(x_labels.iter().map(|l| Span::raw(l.clone())).collect::<Vec<_>>()),
        )
        .y_axis(
            Axis::default()
                .style(muted)
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}", y_min)),
                    Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.1}", y_max)),
                ]),
        );

    frame.render_widget(chart, area);
}

fn series(points: &[ChartPoint], value: impl Fn(&ChartPoint) -> f64) -> Vec<(f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, value(p)))
        .collect()
}

/// Evenly spaced time labels, always including the first and last point.
///
/// The chart spreads labels evenly across the x bounds, so the label count is
/// chosen so that every label sits exactly on a point: the gap between
/// labelled indices must divide `n - 1`.
pub fn x_labels(points: &[ChartPoint]) -> Vec<String> {
    let n = points.len();
    if n <= MAX_X_LABELS {
        return points.iter().map(|p| p.time.clone()).collect();
    }
    let count = (2..=MAX_X_LABELS)
        .rev()
        .find(|k| (n - 1) % (k - 1) == 0)
        .unwrap_or(2);
    let step = (n - 1) / (count - 1);
    (0..count).map(|i| points[i * step].time.clone()).collect()
}

/// Y-axis bounds with a little headroom.
///
/// Non-finite values are ignored. A flat series gets a unit band around its
/// value, and an empty one falls back to `[0, 1]`.
pub fn axis_bounds(values: impl IntoIterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        return [0.0, 1.0];
    }
    let range = max - min;
    if range <= f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    let pad = range * 0.1;
    [min - pad, max + pad]
}
