//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Line and value color for temperature.
    pub temperature: Color,
    /// Line and gauge color for humidity.
    pub humidity: Color,
    /// Color for the live status dot when data is flowing.
    pub live: Color,
    /// Color for errors.
    pub error: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Dimmed text such as axis labels.
    pub muted: Color,
    /// Style for section titles.
    pub header: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            temperature: Color::LightRed,
            humidity: Color::LightBlue,
            live: Color::Green,
            error: Color::Red,
            border: Color::Gray,
            muted: Color::DarkGray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            temperature: Color::Red,
            humidity: Color::Blue,
            live: Color::Green,
            error: Color::Red,
            border: Color::DarkGray,
            muted: Color::Gray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for the header status dot.
    pub fn connection_style(&self, live: bool, failed: bool) -> Style {
        if failed {
            Style::default().fg(self.error).add_modifier(Modifier::BOLD)
        } else if live {
            Style::default().fg(self.live)
        } else {
            Style::default().fg(self.muted)
        }
    }
}
