//! Drawing the panel.
//!
//! ```text
//! ┌ Enter: Start ────────────────────────┐
//! │ > printer says offline█              │
//! └──────────────────────────────────────┘
//! ┌ Troubleshooter ──────────────────────┐
//! │ · Checking spooler...                │
//! │ ● Is the printer powered on?         │
//! │   [ Yes ]  [ No ]                    │
//! └──────────────────────────────────────┘
//!  Ctrl+R Retry · y/n answer · Ctrl+C quit
//! ```

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use troubleshoot_panel::{LayoutLine, PanelConfig, Scrollable};

use crate::app::App;
use crate::theme::{turn_symbol, Theme};

/// Columns taken by the turn symbol and its gap.
pub const PREFIX_WIDTH: u16 = 2;

/// Rows taken by the prompt region when shown.
const INPUT_HEIGHT: u16 = 3;

/// Screen areas of the panel regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub input: Option<Rect>,
    pub conversation: Rect,
    pub footer: Rect,
}

/// Split the screen into regions.
pub fn areas(area: Rect, prompt_visible: bool) -> Areas {
    let input_height = if prompt_visible { INPUT_HEIGHT } else { 0 };
    let [input, conversation, footer] = Layout::vertical([
        Constraint::Length(input_height),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(area);

    Areas {
        input: prompt_visible.then_some(input),
        conversation,
        footer,
    }
}

/// Border around the conversation region.
pub fn conversation_block<'a>(config: &'a PanelConfig, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(format!(" {} ", config.title))
}

/// Draw the whole panel.
pub fn render(app: &App, area: Rect, buf: &mut Buffer) {
    let areas = areas(area, app.prompt_visible());
    if let Some(input) = areas.input {
        render_input(app, input, buf);
    }
    render_conversation(app, areas.conversation, buf);
    render_footer(app, areas.footer, buf);
}

fn render_input(app: &App, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .title(format!(" Enter: {} ", app.config.submit_label));

    let mut spans = vec![Span::styled("> ", Style::default().fg(theme.primary))];
    if app.prompt.is_empty() {
        spans.push(Span::styled("\u{2588}", Style::default().fg(theme.text)));
        spans.push(Span::styled(
            app.config.prompt_placeholder.as_str(),
            Style::default().fg(theme.muted),
        ));
    } else {
        let (before, after) = app.prompt.split_at_cursor();
        spans.push(Span::styled(before, Style::default().fg(theme.text)));
        spans.push(Span::styled("\u{2588}", Style::default().fg(theme.text)));
        spans.push(Span::styled(after, Style::default().fg(theme.text)));
    }

    Paragraph::new(Line::from(spans)).block(block).render(area, buf);
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_conversation(app: &App, area: Rect, buf: &mut Buffer) {
    let panel = &app.panel;
    let mut block = conversation_block(&app.config, &app.theme);
    if !panel.viewport().is_at_bottom(panel.content_height()) {
        block = block.title_bottom(
            Line::from(" \u{2193} more ").style(Style::default().fg(app.theme.info)),
        );
    }
    let inner = block.inner(area);
    block.render(area, buf);

    let lines = panel.lines();
    let top = panel.scroll_top().round().max(0.0) as usize;
    let visible: Vec<Line<'_>> = lines
        .iter()
        .enumerate()
        .skip(top)
        .take(usize::from(inner.height))
        .map(|(idx, line)| {
            let first = idx == 0 || lines[idx - 1].turn != line.turn;
            styled_line(app, line, first)
        })
        .collect();

    Paragraph::new(visible).render(inner, buf);
}

fn styled_line<'a>(app: &App, line: &'a LayoutLine, first: bool) -> Line<'a> {
    let doc = app.panel.renderer().document();
    let theme = &app.theme;
    let Some(turn) = doc.get(line.turn) else {
        return Line::default();
    };

    let prefix = if first {
        format!("{} ", turn_symbol(turn))
    } else {
        "  ".to_string()
    };
    let mut spans = vec![Span::styled(prefix, theme.turn_style(turn))];

    for (i, segment) in line.segments.iter().enumerate() {
        if segment.node == line.turn {
            spans.push(Span::styled(segment.text.as_str(), theme.turn_style(turn)));
            continue;
        }
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = doc
            .get(segment.node)
            .map_or_else(Style::default, |control| theme.control_style(control));
        spans.push(Span::styled(segment.text.as_str(), style));
    }

    Line::from(spans)
}

fn render_footer(app: &App, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;
    let key = Style::default().fg(theme.primary).add_modifier(Modifier::BOLD);
    let hint = Style::default().fg(theme.muted);

    let mut spans = vec![
        Span::styled(" Ctrl+R ", key),
        Span::styled(app.config.retry_label.as_str(), hint),
    ];
    if !app.prompt_visible() {
        spans.push(Span::styled(" \u{b7} ", hint));
        spans.push(Span::styled("y/n ", key));
        spans.push(Span::styled("answer", hint));
    }
    spans.push(Span::styled(" \u{b7} ", hint));
    spans.push(Span::styled("Ctrl+C ", key));
    spans.push(Span::styled("quit", hint));
    if !app.config.footer_text.is_empty() {
        spans.push(Span::styled(" \u{b7} ", hint));
        spans.push(Span::styled(app.config.footer_text.as_str(), hint));
    }
    if !app.host_connected {
        spans.push(Span::styled(" \u{b7} ", hint));
        spans.push(Span::styled("host disconnected", Style::default().fg(theme.error)));
    }

    Paragraph::new(Line::from(spans)).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::buffer_to_string;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;
    use troubleshoot_panel::{InboundMessage, Severity};

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                app.resize(area);
                render(app, area, frame.buffer_mut());
            })
            .unwrap();
        buffer_to_string(terminal.backend().buffer())
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(PanelConfig::default(), tx).unwrap()
    }

    #[test]
    fn test_areas_hide_input_region() {
        let area = Rect::new(0, 0, 80, 24);
        let shown = areas(area, true);
        assert_eq!(shown.input.map(|r| r.height), Some(INPUT_HEIGHT));
        assert_eq!(shown.conversation.height, 20);

        let hidden = areas(area, false);
        assert_eq!(hidden.input, None);
        assert_eq!(hidden.conversation.height, 23);
    }

    #[test]
    fn test_initial_screen_shows_prompt() {
        let mut app = app();
        let screen = draw(&mut app, 60, 12);
        assert!(screen.contains("Enter: Start"));
        assert!(screen.contains("Describe the problem..."));
        assert!(screen.contains("Troubleshooter"));
        assert!(screen.contains("Ctrl+C quit"));
    }

    #[test]
    fn test_question_and_controls_are_drawn() {
        let mut app = app();
        app.handle_action(crate::event::Action::Submit);
        app.receive_frame(&InboundMessage::feedback("Checking logs...").to_json());
        app.receive_frame(&InboundMessage::yes_no("Did that help?").to_json());

        let screen = draw(&mut app, 60, 12);
        assert!(!screen.contains("Enter: Start"));
        assert!(screen.contains("\u{b7} Checking logs..."));
        assert!(screen.contains("\u{25cf} Did that help?"));
        assert!(screen.contains("[ Yes ]  [ No ]"));
        assert!(screen.contains("y/n answer"));
    }

    #[test]
    fn test_running_feedback_symbol() {
        let mut app = app();
        app.receive_frame(&InboundMessage::feedback("Pinging").to_json());
        let screen = draw(&mut app, 60, 12);
        assert!(screen.contains("\u{25cc} Pinging"));
    }

    #[test]
    fn test_long_conversation_shows_latest_lines() {
        let mut app = app();
        app.handle_action(crate::event::Action::Submit);
        draw(&mut app, 40, 10);
        for i in 0..20 {
            let line = InboundMessage::line(Severity::User, format!("entry {i}"));
            app.receive_frame(&line.to_json());
        }
        let screen = draw(&mut app, 40, 10);
        assert!(screen.contains("entry 19"));
        assert!(!screen.contains("entry 5 "));
    }

    #[test]
    fn test_scrolled_up_shows_more_marker() {
        let mut app = app();
        app.handle_action(crate::event::Action::Submit);
        draw(&mut app, 40, 10);
        for i in 0..20 {
            let line = InboundMessage::line(Severity::User, format!("entry {i}"));
            app.receive_frame(&line.to_json());
        }
        app.handle_action(crate::event::Action::PageUp);
        let screen = draw(&mut app, 40, 10);
        assert!(screen.contains("more"));
        assert!(!screen.contains("entry 19"));
    }
}
