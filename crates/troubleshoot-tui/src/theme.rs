//! Catppuccin Mocha color palette and element styling.

use ratatui::style::{Color, Modifier, Style};
use troubleshoot_panel::renderer::class;
use troubleshoot_panel::{Node, Severity};

/// Theme color palette.
#[derive(Debug, Clone)]
pub struct Theme {
    // Foregrounds
    pub text: Color,
    pub subtext: Color,
    pub muted: Color,

    // Accents
    pub primary: Color,
    pub secondary: Color,

    // Semantic
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // Borders
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

impl Theme {
    /// Catppuccin Mocha theme (default dark theme).
    pub fn mocha() -> Self {
        Self {
            text: Color::Rgb(205, 214, 244),    // #cdd6f4
            subtext: Color::Rgb(166, 173, 200), // #a6adc8
            muted: Color::Rgb(108, 112, 134),   // #6c7086

            primary: Color::Rgb(180, 190, 254),   // #b4befe (lavender)
            secondary: Color::Rgb(148, 226, 213), // #94e2d5 (teal)

            success: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
            warning: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
            error: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
            info: Color::Rgb(137, 180, 250),    // #89b4fa (blue)

            border: Color::Rgb(69, 71, 90),            // #45475a
            border_focused: Color::Rgb(180, 190, 254), // #b4befe (lavender)
        }
    }

    /// Style for a conversation turn, from its classes.
    pub fn turn_style(&self, node: &Node) -> Style {
        if node.has_class(class::FEEDBACK) {
            let style = Style::default().fg(self.subtext);
            return if node.has_class(class::RUNNING) {
                style.fg(self.info).add_modifier(Modifier::ITALIC)
            } else {
                style
            };
        }
        match severity_of(node) {
            Some(Severity::Warning) => Style::default().fg(self.warning),
            Some(Severity::Error) => Style::default().fg(self.error).add_modifier(Modifier::BOLD),
            Some(Severity::User) => Style::default().fg(self.primary),
            Some(Severity::Assistance) | None => Style::default().fg(self.text),
        }
    }

    /// Style for an answer control.
    pub fn control_style(&self, node: &Node) -> Style {
        if node.has_class(class::SELECTED) {
            Style::default()
                .fg(self.success)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else if node.has_class(class::DESELECTED) || node.disabled {
            Style::default()
                .fg(self.muted)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default()
                .fg(self.secondary)
                .add_modifier(Modifier::BOLD)
        }
    }
}

/// Leading symbol for the first line of a turn.
///
/// Returns:
/// - `›` for user lines
/// - `●` for assistance lines
/// - `◌` for a running feedback line, `·` once superseded
/// - `!` for warnings, `✗` for errors
pub fn turn_symbol(node: &Node) -> &'static str {
    if node.has_class(class::YES_NO) {
        return " ";
    }
    if node.has_class(class::FEEDBACK) {
        return if node.has_class(class::RUNNING) {
            "\u{25cc}" // ◌
        } else {
            "\u{00b7}" // ·
        };
    }
    match severity_of(node) {
        Some(Severity::User) => "\u{203a}", // ›
        Some(Severity::Warning) => "!",
        Some(Severity::Error) => "\u{2717}", // ✗
        Some(Severity::Assistance) | None => "\u{25cf}", // ●
    }
}

fn severity_of(node: &Node) -> Option<Severity> {
    Severity::ALL
        .into_iter()
        .find(|s| node.has_class(s.as_str()))
}
