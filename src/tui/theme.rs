//! Theme and color definitions for the TUI.

use crate::types::SignalAction;
use ratatui::style::{Color, Modifier, Style};

/// Theme for the TUI with consistent color scheme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    /// Get style for titles.
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for table headers.
    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for muted text.
    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Get style for errors.
    pub fn error(&self) -> Style {
        Style::default().fg(self.danger)
    }

    /// Get style for borders.
    pub fn border(&self) -> Style {
        Style::default().fg(self.primary)
    }

    /// Style for a signal action cell.
    pub fn action(&self, action: SignalAction) -> Style {
        let color = match action {
            SignalAction::Buy => self.success,
            SignalAction::Sell => self.danger,
            SignalAction::Hold => self.warning,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Style for a confidence cell; brighter means more conviction.
    pub fn confidence(&self, confidence: f64) -> Style {
        if confidence > 0.85 {
            Style::default()
                .fg(self.success)
                .add_modifier(Modifier::BOLD)
        } else if confidence > 0.6 {
            Style::default().fg(self.warning)
        } else {
            Style::default().fg(self.muted)
        }
    }

    /// Style for the trend cell.
    pub fn trend(&self, up: bool) -> Style {
        Style::default().fg(if up { self.success } else { self.danger })
    }
}
