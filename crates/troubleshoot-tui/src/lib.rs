//! troubleshoot-tui: Terminal front end for the troubleshooting panel
//!
//! This crate draws a [`troubleshoot_panel::Panel`] in the terminal:
//! - Prompt region with line editing
//! - Conversation region with sticky scrolling
//! - Footer with the retry control
//! - Headless mode for testing and automation

mod app;
mod event;
pub mod headless;
mod prompt;
mod theme;
mod view;

pub use app::{App, OutboundSender};
pub use event::{Action, Event, EventHandler};
pub use prompt::PromptInput;
pub use theme::Theme;
pub use troubleshoot_panel;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use tokio::sync::mpsc;
use troubleshoot_panel::{HostBridge, PanelConfig};

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the panel in the terminal until the user quits.
///
/// Frames from `bridge` are rendered as they arrive. The terminal is
/// restored on exit.
pub async fn run_tui(
    config: PanelConfig,
    bridge: HostBridge,
) -> Result<(), Box<dyn std::error::Error>> {
    let (sender, mut frames) = bridge.split();
    let mut app = App::new(config, sender)?;

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 4 Hz tick rate
    let mut events = EventHandler::new(250);

    let result = run_loop(&mut terminal, &mut app, &mut events, &mut frames).await;

    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    frames: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            app.resize(area);
            view::render(app, area, frame.buffer_mut());
        })?;

        if app.should_quit {
            break;
        }

        tokio::select! {
            event = events.next() => match event {
                Some(event) => app.handle_event(event),
                None => break,
            },
            frame = frames.recv(), if app.host_connected => match frame {
                Some(frame) => app.receive_frame(&frame),
                None => app.host_disconnected(),
            },
        }
    }

    tracing::info!(rejected = app.rejected_frames, "panel closed");
    Ok(())
}
