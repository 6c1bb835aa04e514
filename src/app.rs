//! Application state and navigation logic.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::component::{HistoricalGraph, RealtimeFeed};
use crate::data::FilterMode;
use crate::error::DatabaseError;
use crate::export::HistoryExport;
use crate::source::Database;
use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Live temperature and humidity gauges.
    Live,
    /// Daily or monthly history charts.
    History,
}

impl View {
    /// Cycle to the other view.
    pub fn next(self) -> Self {
        match self {
            View::Live => View::History,
            View::History => View::Live,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Live => "Live",
            View::History => "History",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Data
    db: Arc<dyn Database>,
    pub feed: RealtimeFeed,
    pub graph: HistoricalGraph,

    // Date entry ("g")
    pub date_input: String,
    pub date_input_active: bool,

    // UI
    pub theme: Theme,
    /// Advances every poll, drives the loading spinner.
    pub tick: usize,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the app and mount both components against `db`.
    pub fn new(db: Arc<dyn Database>, mode: FilterMode, date: NaiveDate, theme: Theme) -> Self {
        let feed = RealtimeFeed::mount(db.as_ref());
        let graph = HistoricalGraph::new(db.clone(), mode, date);
        Self {
            running: true,
            current_view: View::Live,
            show_help: false,
            db,
            feed,
            graph,
            date_input: String::new(),
            date_input_active: false,
            theme,
            tick: 0,
            status_message: None,
        }
    }

    /// Returns a description of the database backend.
    pub fn source_description(&self) -> &str {
        self.db.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Apply pending deliveries to both components.
    ///
    /// Returns true if anything changed.
    pub fn poll_data(&mut self) -> bool {
        self.tick = self.tick.wrapping_add(1);
        let feed_changed = self.feed.poll();
        let graph_changed = self.graph.poll();
        feed_changed || graph_changed
    }

    /// The first subscription error, history first when it is on screen.
    pub fn error(&self) -> Option<DatabaseError> {
        match self.current_view {
            View::History => self.graph.error().or_else(|| self.feed.error()),
            View::Live => self.feed.error().or_else(|| self.graph.error()),
        }
    }

    /// Switch to the other view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.graph.set_filter(mode);
    }

    pub fn toggle_filter(&mut self) {
        self.graph.toggle_filter();
    }

    pub fn step_forward(&mut self) {
        self.graph.step_forward();
    }

    pub fn step_back(&mut self) {
        self.graph.step_back();
    }

    pub fn go_to_today(&mut self) {
        self.graph.today();
    }

    /// Re-establish the live and history subscriptions.
    pub fn resubscribe(&mut self) {
        self.feed.resubscribe(self.db.as_ref());
        self.graph.resubscribe();
        self.set_status_message(format!("Resubscribed to {}", self.graph.path()));
    }

    /// Enter date input mode (starts capturing keystrokes).
    pub fn start_date_input(&mut self) {
        self.date_input.clear();
        self.date_input_active = true;
    }

    /// Leave date input mode without applying it.
    pub fn cancel_date_input(&mut self) {
        self.date_input.clear();
        self.date_input_active = false;
    }

    /// Append a character to the date input.
    pub fn date_input_push(&mut self, c: char) {
        if c.is_ascii_digit() || c == '-' {
            self.date_input.push(c);
        }
    }

    /// Remove the last character from the date input.
    pub fn date_input_pop(&mut self) {
        self.date_input.pop();
    }

    /// Apply the typed date and leave input mode.
    ///
    /// Accepts `YYYY-MM-DD`, or `YYYY-MM` (first of the month).
    pub fn submit_date_input(&mut self) {
        let input = std::mem::take(&mut self.date_input);
        self.date_input_active = false;
        match parse_date_input(&input) {
            Some(date) => {
                self.graph.set_date(date);
                self.current_view = View::History;
            }
            None => self.set_status_message(format!("Invalid date: {}", input)),
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current history points to a file.
    pub fn export_history(&self, path: &Path) -> Result<()> {
        if !self.graph.loaded() {
            bail!("No history loaded yet");
        }
        HistoryExport::from_graph(&self.graph).write_to(path)
    }

    /// Release every subscription.
    pub fn shutdown(self) {
        self.feed.unmount();
        self.graph.unmount();
    }
}

/// Parse `YYYY-MM-DD`, or `YYYY-MM` as the first of that month.
pub fn parse_date_input(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", input), "%Y-%m-%d"))
        .ok()
}
