use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, View};
use crate::data::FilterMode;

/// Where `e` writes the history export.
const EXPORT_FILE: &str = "history_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // If date input is active, handle text input
    if app.date_input_active {
        handle_date_input(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab | KeyCode::BackTab => app.next_view(),
        KeyCode::Char('1') => app.set_view(View::Live),
        KeyCode::Char('2') => app.set_view(View::History),

        // Filter mode
        KeyCode::Char('d') => app.set_filter(FilterMode::Daily),
        KeyCode::Char('m') => app.set_filter(FilterMode::Monthly),
        KeyCode::Char('f') => app.toggle_filter(),

        // Date navigation
        KeyCode::Left | KeyCode::Char('h') => app.step_back(),
        KeyCode::Right | KeyCode::Char('l') => app.step_forward(),
        KeyCode::Char('t') => app.go_to_today(),
        KeyCode::Char('g') => app.start_date_input(),

        // Resubscribe
        KeyCode::Char('r') => app.resubscribe(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_history(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while the date prompt is open
fn handle_date_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_date_input(),
        KeyCode::Esc => app.cancel_date_input(),
        KeyCode::Backspace => app.date_input_pop(),
        KeyCode::Char(c) => app.date_input_push(c),
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel steps through dates on the history view
        MouseEventKind::ScrollUp if app.current_view == View::History => app.step_back(),
        MouseEventKind::ScrollDown if app.current_view == View::History => app.step_forward(),

        // Tab clicks (row 1, after header)
        MouseEventKind::Down(MouseButton::Left) if mouse.row == 1 => {
            // Approximate tab positions: " 1:Live " (0-9), " 2:History " (10-22)
            if mouse.column < 10 {
                app.set_view(View::Live);
            } else if mouse.column < 23 {
                app.set_view(View::History);
            }
        }

        _ => {}
    }
}
