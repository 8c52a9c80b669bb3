//! Headless mode for the panel TUI.
//!
//! Runs the TUI against a `TestBackend` instead of a real terminal. Actions
//! are sent via a channel, the host side is an in-process [`HostEndpoint`],
//! and screen state is captured after each render.

use crate::app::App;
use crate::event::Action;
use crate::view;
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use troubleshoot_panel::{channel, HostEndpoint, PanelConfig};

/// State captured from the headless TUI after each render.
#[derive(Debug, Clone, Default)]
pub struct HeadlessState {
    /// Text contents of the terminal buffer.
    pub screen_contents: String,
    /// Whether the prompt region is shown.
    pub prompt_visible: bool,
    /// Conversation transcript, one entry per turn.
    pub transcript: Vec<String>,
    /// Whether the TUI should quit.
    pub should_quit: bool,
}

/// Handle to control a headless TUI instance.
pub struct HeadlessHandle {
    action_tx: mpsc::UnboundedSender<Action>,
    state_rx: watch::Receiver<HeadlessState>,
}

impl HeadlessHandle {
    /// Send an action to the TUI.
    ///
    /// Returns `true` if the action was sent successfully.
    pub fn send_action(&self, action: Action) -> bool {
        self.action_tx.send(action).is_ok()
    }

    /// Type a string into the prompt.
    pub fn type_text(&self, text: &str) -> bool {
        text.chars().all(|ch| self.send_action(Action::Insert(ch)))
    }

    /// Get the current state of the TUI.
    pub fn state(&self) -> HeadlessState {
        self.state_rx.borrow().clone()
    }

    /// Wait until a condition is met on the state.
    ///
    /// Returns the state when the condition is met, or `None` if timed out.
    pub async fn wait_for<F>(&mut self, condition: F, timeout: Duration) -> Option<HeadlessState>
    where
        F: Fn(&HeadlessState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let state = self.state();
            if condition(&state) {
                return Some(state);
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }

            if tokio::time::timeout(remaining, self.state_rx.changed())
                .await
                .is_err()
            {
                return None;
            }
        }
    }

    /// Wait for specific text to appear on screen.
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> Option<HeadlessState> {
        self.wait_for(|s| s.screen_contents.contains(text), timeout)
            .await
    }
}

/// Configuration for headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Terminal width.
    pub width: u16,
    /// Terminal height.
    pub height: u16,
    /// Tick rate in milliseconds.
    pub tick_rate_ms: u64,
}

impl HeadlessConfig {
    /// Terminal size taken from the panel configuration.
    pub fn from_panel(config: &PanelConfig) -> Self {
        Self {
            width: config.headless_width,
            height: config.headless_height,
            ..Self::default()
        }
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            tick_rate_ms: 50,
        }
    }
}

/// Run the TUI in headless mode.
///
/// Returns a handle to drive the UI, the host side of the panel's bridge,
/// and a join handle for the background task.
///
/// ```ignore
/// let (mut ui, host, task) = run_tui_headless(PanelConfig::default(), HeadlessConfig::default());
/// ui.type_text("no sound");
/// ui.send_action(Action::Submit);
/// host.post(&InboundMessage::yes_no("Is the volume up?"));
/// ui.wait_for_text("[ Yes ]", Duration::from_secs(1)).await;
/// ui.send_action(Action::Quit);
/// task.await.unwrap();
/// ```
pub fn run_tui_headless(
    panel: PanelConfig,
    config: HeadlessConfig,
) -> (HeadlessHandle, HostEndpoint, JoinHandle<Result<(), String>>) {
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(HeadlessState::default());
    let (bridge, endpoint) = channel();

    let task = tokio::spawn(async move {
        let (sender, frames) = bridge.split();
        run_headless_loop(panel, sender, frames, config, action_rx, state_tx)
            .await
            .map_err(|e| e.to_string())
    });

    let handle = HeadlessHandle {
        action_tx,
        state_rx,
    };

    (handle, endpoint, task)
}

async fn run_headless_loop(
    panel: PanelConfig,
    sender: mpsc::UnboundedSender<troubleshoot_panel::OutboundMessage>,
    mut frames: mpsc::UnboundedReceiver<String>,
    config: HeadlessConfig,
    mut action_rx: mpsc::UnboundedReceiver<Action>,
    state_tx: watch::Sender<HeadlessState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let backend = TestBackend::new(config.width, config.height);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new(panel, sender)?;

    let tick_duration = Duration::from_millis(config.tick_rate_ms);

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            app.resize(area);
            view::render(&app, area, frame.buffer_mut());
        })?;

        let _ = state_tx.send(HeadlessState {
            screen_contents: buffer_to_string(terminal.backend().buffer()),
            prompt_visible: app.prompt_visible(),
            transcript: app.panel.renderer().transcript(),
            should_quit: app.should_quit,
        });

        if app.should_quit {
            break;
        }

        tokio::select! {
            Some(action) = action_rx.recv() => app.handle_action(action),
            frame = frames.recv(), if app.host_connected => match frame {
                Some(frame) => app.receive_frame(&frame),
                None => app.host_disconnected(),
            },
            () = tokio::time::sleep(tick_duration) => {}
        }
    }

    Ok(())
}

/// Convert a terminal buffer to a string representation.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        // Trim trailing whitespace from each line
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}
