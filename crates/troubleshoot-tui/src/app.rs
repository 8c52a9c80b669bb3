//! Application state and update logic for the panel TUI.

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use troubleshoot_panel::{
    Answer, BootstrapError, Handled, InputState, OutboundMessage, Panel, PanelConfig, UserAction,
};

use crate::event::{key_to_action, mouse_to_action, Action, Event};
use crate::prompt::PromptInput;
use crate::theme::Theme;
use crate::view;

/// Sender type the TUI panel writes outbound messages to.
pub type OutboundSender = mpsc::UnboundedSender<OutboundMessage>;

/// TUI application state.
#[derive(Debug)]
pub struct App {
    /// The panel being displayed.
    pub panel: Panel<OutboundSender>,
    /// Editing state mirrored into the panel's prompt control.
    pub prompt: PromptInput,
    pub config: PanelConfig,
    pub theme: Theme,
    pub should_quit: bool,
    /// False once the host has closed its side of the bridge.
    pub host_connected: bool,
    /// Frames rejected as protocol violations.
    pub rejected_frames: usize,
}

impl App {
    /// Bootstrap the panel and wrap it in an app.
    pub fn new(config: PanelConfig, sender: OutboundSender) -> Result<Self, BootstrapError> {
        let panel = Panel::headless(&config, sender)?;
        Ok(Self {
            panel,
            prompt: PromptInput::new(),
            config,
            theme: Theme::default(),
            should_quit: false,
            host_connected: true,
            rejected_frames: 0,
        })
    }

    /// Whether the prompt region is shown.
    pub fn prompt_visible(&self) -> bool {
        self.panel.renderer().input_state() == InputState::Visible
    }

    /// Render one raw frame from the host.
    pub fn receive_frame(&mut self, frame: &str) {
        if self.panel.receive(frame).is_err() {
            self.rejected_frames += 1;
        }
        // A reset clears the prompt control
        self.prompt.sync(self.panel.renderer().prompt_value());
    }

    /// Note that the host went away.
    pub fn host_disconnected(&mut self) {
        if self.host_connected {
            tracing::info!("host disconnected");
        }
        self.host_connected = false;
    }

    /// Fit the conversation viewport to the terminal area.
    pub fn resize(&mut self, area: Rect) {
        let areas = view::areas(area, self.prompt_visible());
        let inner = view::conversation_block(&self.config, &self.theme).inner(areas.conversation);
        self.panel
            .resize(inner.width.saturating_sub(view::PREFIX_WIDTH), inner.height);
    }

    /// Handle a terminal event.
    pub fn handle_event(&mut self, event: Event) {
        let action = match event {
            Event::Key(key) => key_to_action(key, self.prompt_visible()),
            Event::Mouse(mouse) => mouse_to_action(mouse),
            Event::Tick | Event::Resize(..) => Action::None,
        };
        self.handle_action(action);
    }

    /// Handle an action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Insert(ch) => self.edit(|p| p.insert(ch)),
            Action::Backspace => self.edit(PromptInput::backspace),
            Action::CursorLeft => self.prompt.move_left(),
            Action::CursorRight => self.prompt.move_right(),
            Action::CursorHome => self.prompt.move_home(),
            Action::CursorEnd => self.prompt.move_end(),
            Action::Submit => {
                self.panel.act(UserAction::Submit);
            }
            Action::AnswerYes => self.answer(Answer::Yes),
            Action::AnswerNo => self.answer(Answer::No),
            Action::Retry => {
                self.panel.act(UserAction::Retry);
            }
            Action::ScrollUp => self.panel.scroll_by(-1.0),
            Action::ScrollDown => self.panel.scroll_by(1.0),
            Action::PageUp => self.panel.scroll_by(-self.page_size()),
            Action::PageDown => self.panel.scroll_by(self.page_size()),
            Action::ScrollToBottom => self.panel.scroll_to_bottom(),
            Action::None => {}
        }
    }

    fn edit(&mut self, change: impl FnOnce(&mut PromptInput)) {
        if !self.prompt_visible() {
            return;
        }
        change(&mut self.prompt);
        self.panel
            .act(UserAction::EditPrompt(self.prompt.content().to_string()));
    }

    fn answer(&mut self, answer: Answer) {
        let Some(pair) = self.panel.renderer().pending_pair() else {
            tracing::debug!("no question awaiting an answer");
            return;
        };
        if self.panel.act(UserAction::Answer { pair, answer }) == Handled::Ignored {
            tracing::debug!(?pair, "answer ignored");
        }
    }

    fn page_size(&self) -> f64 {
        (self.panel.viewport().client_height() - 1.0).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troubleshoot_panel::{InboundMessage, Scrollable};

    fn app() -> (App, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(PanelConfig::default(), tx).unwrap(), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<OutboundMessage>) -> Vec<OutboundMessage> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_typing_and_submit() {
        let (mut app, mut rx) = app();
        for ch in "no sound".chars() {
            app.handle_action(Action::Insert(ch));
        }
        app.handle_action(Action::Submit);

        assert_eq!(drain(&mut rx), vec![OutboundMessage::submit("no sound")]);
        assert!(!app.prompt_visible());

        // Typing after submit does nothing
        app.handle_action(Action::Insert('x'));
        assert_eq!(app.prompt.content(), "no sound");
    }

    #[test]
    fn test_answer_targets_pending_question() {
        let (mut app, mut rx) = app();
        app.handle_action(Action::Submit);
        app.receive_frame(&InboundMessage::yes_no("Is the speaker muted?").to_json());

        app.handle_action(Action::AnswerYes);
        app.handle_action(Action::AnswerNo);

        assert_eq!(
            drain(&mut rx),
            vec![OutboundMessage::submit(""), OutboundMessage::resume(true)]
        );
    }

    #[test]
    fn test_reset_restores_empty_prompt() {
        let (mut app, mut rx) = app();
        app.handle_action(Action::Insert('a'));
        app.handle_action(Action::Submit);
        app.receive_frame(r#"{"type":"reset"}"#);

        assert!(app.prompt_visible());
        assert!(app.prompt.is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![OutboundMessage::submit("a"), OutboundMessage::Reset]
        );
    }

    #[test]
    fn test_rejected_frames_are_counted() {
        let (mut app, _rx) = app();
        app.receive_frame(r#"{"type":"mystery"}"#);
        assert_eq!(app.rejected_frames, 1);
        assert!(app.panel.renderer().turns().is_empty());
    }

    #[test]
    fn test_scroll_actions() {
        let (mut app, _rx) = app();
        app.resize(Rect::new(0, 0, 40, 12));
        for i in 0..30 {
            app.receive_frame(&InboundMessage::feedback(format!("step {i}")).to_json());
        }
        let bottom = app.panel.scroll_top();
        assert!(bottom > 0.0);

        app.handle_action(Action::ScrollUp);
        assert!((app.panel.scroll_top() - (bottom - 1.0)).abs() < f64::EPSILON);

        app.handle_action(Action::ScrollToBottom);
        assert!((app.panel.scroll_top() - bottom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quit() {
        let (mut app, _rx) = app();
        app.handle_action(Action::Quit);
        assert!(app.should_quit);
    }
}
