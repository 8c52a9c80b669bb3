//! Panel bootstrap and message loop.
//!
//! [`Panel::bootstrap`] builds the top-level regions once into a root anchor
//! and hands the document to the [`ConversationRenderer`]. Every render the
//! panel performs afterwards runs inside [`with_sticky_scroll`].

use crate::bridge::{HostBridge, HostSender};
use crate::config::PanelConfig;
use crate::element::{element, Document, Element, NodeId, Tag};
use crate::layout::{layout_turns, LayoutLine};
use crate::protocol::{InboundMessage, ProtocolError};
use crate::renderer::{ConversationRenderer, Handled, Regions, UserAction};
use crate::scroll::{with_sticky_scroll, Scrollable, Viewport};

/// Identifiers of the top-level regions.
pub mod ids {
    pub const INPUT: &str = "input-region";
    pub const PROMPT: &str = "prompt";
    pub const SUBMIT: &str = "submit";
    pub const CONVERSATION: &str = "conversation";
    pub const FOOTER: &str = "footer";
    pub const RETRY: &str = "retry";
}

/// Build the input region, conversation region and footer into the anchor.
///
/// Any previous content of the anchor is dropped, so building into a
/// reloaded document starts from scratch.
pub fn build_layout(
    document: &mut Document,
    config: &PanelConfig,
) -> Result<Regions, BootstrapError> {
    let anchor = document
        .find_by_id(&config.root_id)
        .ok_or_else(|| BootstrapError::MissingAnchor(config.root_id.clone()))?;
    document.clear_children(anchor);

    let input_region = element(
        Tag::Section,
        &["input-region"],
        Some(ids::INPUT),
        vec![
            Element::new(Tag::TextArea)
                .id(ids::PROMPT)
                .class("prompt")
                .content(config.prompt_placeholder.as_str()),
            Element::new(Tag::Button)
                .id(ids::SUBMIT)
                .class("submit")
                .content(config.submit_label.as_str()),
        ],
    );
    let conversation = element(
        Tag::Section,
        &["conversation"],
        Some(ids::CONVERSATION),
        Vec::new(),
    );
    let footer = element(
        Tag::Footer,
        &["footer"],
        Some(ids::FOOTER),
        vec![
            Element::new(Tag::Button)
                .id(ids::RETRY)
                .class("retry")
                .content(config.retry_label.as_str()),
            Element::new(Tag::Paragraph).content(config.footer_text.as_str()),
        ],
    );

    let input = document
        .append(anchor, input_region)
        .ok_or(BootstrapError::Detached(ids::INPUT))?;
    let conversation = document
        .append(anchor, conversation)
        .ok_or(BootstrapError::Detached(ids::CONVERSATION))?;
    let footer = document
        .append(anchor, footer)
        .ok_or(BootstrapError::Detached(ids::FOOTER))?;

    let &[prompt, submit] = document.children(input) else {
        return Err(BootstrapError::Detached(ids::PROMPT));
    };
    let retry = document
        .children(footer)
        .first()
        .copied()
        .ok_or(BootstrapError::Detached(ids::RETRY))?;

    Ok(Regions {
        input,
        prompt,
        submit,
        conversation,
        footer,
        retry,
    })
}

/// Counts from a finished message loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub handled: usize,
    pub rejected: usize,
}

/// The panel: renderer plus the scroll state of the conversation region.
///
/// The conversation's line layout is cached. Appended turns are laid out
/// on their own; a reset or a width change lays out the region again.
#[derive(Debug)]
pub struct Panel<S: HostSender> {
    renderer: ConversationRenderer<S>,
    viewport: Viewport,
    width: usize,
    lines: Vec<LayoutLine>,
    /// Number of turns covered by `lines`, and the last of them.
    laid_out: usize,
    last_turn: Option<NodeId>,
}

impl<S: HostSender> Panel<S> {
    /// Build the panel into `document`.
    ///
    /// Fails if the anchor named by `config.root_id` does not exist.
    pub fn bootstrap(
        mut document: Document,
        config: &PanelConfig,
        sender: S,
    ) -> Result<Self, BootstrapError> {
        let regions = build_layout(&mut document, config)?;
        tracing::debug!(root = %config.root_id, "panel layout built");
        Ok(Self {
            renderer: ConversationRenderer::new(document, regions, sender, config),
            viewport: Viewport::new(f64::from(config.headless_height)),
            width: usize::from(config.headless_width).max(1),
            lines: Vec::new(),
            laid_out: 0,
            last_turn: None,
        })
    }

    /// Build the panel into a fresh document containing only the anchor.
    pub fn headless(config: &PanelConfig, sender: S) -> Result<Self, BootstrapError> {
        Self::bootstrap(Document::with_anchor(&config.root_id), config, sender)
    }

    /// The conversation renderer.
    pub fn renderer(&self) -> &ConversationRenderer<S> {
        &self.renderer
    }

    /// Mutable access to the outbound sink.
    pub fn sender_mut(&mut self) -> &mut S {
        self.renderer.sender_mut()
    }

    /// Current scroll state.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Layout width of the conversation region.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Content height of the conversation region, in lines.
    pub fn content_height(&self) -> f64 {
        // Line counts stay far below f64's exact integer range.
        #[allow(clippy::cast_precision_loss)]
        let height = self.lines.len() as f64;
        height
    }

    /// Conversation laid out at the current width.
    pub fn lines(&self) -> &[LayoutLine] {
        &self.lines
    }

    /// Decode and render one raw frame from the host.
    ///
    /// A frame that violates the protocol is logged and produces no turn.
    /// It is not handled as an inbound message, so it does not clear the
    /// running marker. The panel keeps handling later frames.
    pub fn receive(&mut self, frame: &str) -> Result<(), ProtocolError> {
        let message = InboundMessage::from_json(frame).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected inbound message");
        })?;
        self.receive_message(message);
        Ok(())
    }

    /// Render one decoded message.
    pub fn receive_message(&mut self, message: InboundMessage) {
        with_sticky_scroll(self, |panel| {
            panel.renderer.handle_inbound(message);
            panel.refresh_layout();
        });
        self.settle();
    }

    /// Apply a user action.
    pub fn act(&mut self, action: UserAction) -> Handled {
        let handled = with_sticky_scroll(self, |panel| {
            let handled = panel.renderer.handle_action(action);
            panel.refresh_layout();
            handled
        });
        self.settle();
        handled
    }

    /// Resize the conversation viewport.
    ///
    /// A viewport showing the bottom keeps showing it.
    pub fn resize(&mut self, width: u16, height: u16) {
        let at_bottom = self.viewport.is_at_bottom(self.content_height());
        let width = usize::from(width).max(1);
        if width != self.width {
            self.width = width;
            self.relayout();
        }
        self.viewport.set_client_height(f64::from(height));
        if at_bottom {
            self.scroll_to_bottom();
        } else {
            self.settle();
        }
    }

    /// Scroll by `delta` lines (negative is up).
    pub fn scroll_by(&mut self, delta: f64) {
        let top = self.scroll_top() + delta;
        self.set_scroll_top(top);
    }

    /// Jump to the end of the conversation.
    pub fn scroll_to_bottom(&mut self) {
        let bottom = self.scroll_height() - self.client_height();
        self.set_scroll_top(bottom);
    }

    /// Handle frames from the host until it disconnects.
    pub async fn run(&mut self, bridge: &mut HostBridge) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(frame) = bridge.next_frame().await {
            if self.receive(&frame).is_ok() {
                summary.handled += 1;
            } else {
                summary.rejected += 1;
            }
        }
        tracing::info!(
            handled = summary.handled,
            rejected = summary.rejected,
            "host disconnected"
        );
        summary
    }

    /// Bring the cached layout up to date with the conversation.
    ///
    /// Turns are only ever appended or cleared all at once, so if the last
    /// laid-out turn is still in place only the turns after it are new.
    fn refresh_layout(&mut self) {
        let turns = self.renderer.turns();
        let last_kept = self
            .laid_out
            .checked_sub(1)
            .and_then(|last| turns.get(last).copied());
        if last_kept != self.last_turn {
            self.relayout();
            return;
        }

        let document = self.renderer.document();
        let added = layout_turns(document, &turns[self.laid_out..], self.width);
        self.lines.extend(added);
        self.laid_out = turns.len();
        self.last_turn = turns.last().copied();
    }

    fn relayout(&mut self) {
        let turns = self.renderer.turns();
        self.lines = layout_turns(self.renderer.document(), turns, self.width);
        self.laid_out = turns.len();
        self.last_turn = turns.last().copied();
    }

    fn settle(&mut self) {
        let height = self.content_height();
        self.viewport.clamp(height);
    }
}

impl<S: HostSender> Scrollable for Panel<S> {
    fn scroll_height(&self) -> f64 {
        self.viewport.scroll_height(self.content_height())
    }

    fn client_height(&self) -> f64 {
        self.viewport.client_height()
    }

    fn scroll_top(&self) -> f64 {
        self.viewport.scroll_top(self.content_height())
    }

    fn set_scroll_top(&mut self, top: f64) {
        let height = self.content_height();
        self.viewport.set_scroll_top(top, height);
    }
}

/// Errors that abort panel startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The root anchor is not in the document.
    #[error("root anchor `{0}` not found")]
    MissingAnchor(String),

    /// A freshly built region could not be resolved.
    #[error("region `{0}` is not attached")]
    Detached(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge;
    use crate::layout::layout_region;
    use crate::protocol::{OutboundMessage, Severity};
    use crate::renderer::{Answer, InputState};

    fn config(width: u16, height: u16) -> PanelConfig {
        PanelConfig {
            headless_width: width,
            headless_height: height,
            ..PanelConfig::default()
        }
    }

    fn panel(width: u16, height: u16) -> Panel<Vec<OutboundMessage>> {
        Panel::headless(&config(width, height), Vec::new()).unwrap()
    }

    fn fill(panel: &mut Panel<Vec<OutboundMessage>>, count: usize) {
        for i in 0..count {
            panel.receive_message(InboundMessage::line(Severity::User, format!("line {i}")));
        }
    }

    #[test]
    fn test_missing_anchor_is_fatal() {
        let err = Panel::bootstrap(Document::new(), &PanelConfig::default(), Vec::new())
            .unwrap_err();
        assert!(matches!(err, BootstrapError::MissingAnchor(ref id) if id == "root"));
    }

    #[test]
    fn test_layout_builds_regions_once() {
        let config = PanelConfig::default();
        let mut doc = Document::with_anchor("root");
        build_layout(&mut doc, &config).unwrap();
        let regions = build_layout(&mut doc, &config).unwrap();

        let anchor = doc.find_by_id("root").unwrap();
        assert_eq!(doc.children(anchor).len(), 3);
        assert_eq!(doc.find_by_id(ids::CONVERSATION), Some(regions.conversation));
        assert_eq!(doc.find_by_id(ids::PROMPT), Some(regions.prompt));
        assert_eq!(doc.find_by_id(ids::SUBMIT), Some(regions.submit));
        assert_eq!(doc.find_by_id(ids::RETRY), Some(regions.retry));
    }

    #[test]
    fn test_protocol_violation_renders_nothing_and_panel_continues() {
        let mut panel = panel(40, 10);
        panel.receive(r#"{"type":"feedback","content":"Working"}"#).unwrap();
        let running = panel.renderer().running_turn();

        assert!(panel.receive(r#"{"type":"banner","content":"x"}"#).is_err());
        assert!(panel.receive("garbage").is_err());
        assert_eq!(panel.renderer().turns().len(), 1);
        assert_eq!(panel.renderer().running_turn(), running);

        panel.receive(r#"{"type":"error","content":"Failed"}"#).unwrap();
        assert_eq!(panel.renderer().turns().len(), 2);
        assert!(panel.sender_mut().is_empty());
    }

    #[test]
    fn test_pinned_panel_follows_appends() {
        let mut panel = panel(40, 5);
        fill(&mut panel, 12);
        assert!((panel.scroll_top() - 7.0).abs() < f64::EPSILON);
        assert!(panel.viewport().is_at_bottom(panel.content_height()));
    }

    #[test]
    fn test_scrolled_up_panel_keeps_offset() {
        let mut panel = panel(40, 5);
        fill(&mut panel, 12);
        panel.scroll_by(-4.0);
        assert!((panel.scroll_top() - 3.0).abs() < f64::EPSILON);

        fill(&mut panel, 3);
        assert!((panel.scroll_top() - 3.0).abs() < f64::EPSILON);

        panel.scroll_to_bottom();
        fill(&mut panel, 1);
        assert!((panel.scroll_top() - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_one_line_above_bottom_still_follows() {
        let mut panel = panel(40, 5);
        fill(&mut panel, 12);
        panel.scroll_by(-1.0);
        fill(&mut panel, 2);
        assert!((panel.scroll_top() - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_two_lines_above_bottom_stays_put() {
        let mut panel = panel(40, 5);
        fill(&mut panel, 12);
        panel.scroll_by(-2.0);
        fill(&mut panel, 2);
        assert!((panel.scroll_top() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_collapses_scroll() {
        let mut panel = panel(40, 5);
        fill(&mut panel, 12);
        panel.receive_message(InboundMessage::Reset);
        assert!(panel.scroll_top().abs() < f64::EPSILON);
        assert_eq!(panel.renderer().input_state(), InputState::Visible);
    }

    #[test]
    fn test_resize_keeps_bottom_pinned() {
        let mut panel = panel(40, 5);
        fill(&mut panel, 12);
        panel.resize(40, 3);
        assert!((panel.scroll_top() - 9.0).abs() < f64::EPSILON);
    }

    fn assert_layout_current(panel: &Panel<Vec<OutboundMessage>>) {
        let fresh = layout_region(
            panel.renderer().document(),
            panel.renderer().regions().conversation,
            panel.width(),
        );
        assert_eq!(panel.lines(), fresh.as_slice());
    }

    #[test]
    fn test_cached_layout_tracks_every_change() {
        let mut panel = panel(12, 5);
        assert_layout_current(&panel);

        panel.receive_message(InboundMessage::feedback("Checking the network adapter"));
        assert_layout_current(&panel);
        panel.receive_message(InboundMessage::yes_no("Is the cable plugged in?"));
        assert_layout_current(&panel);

        let pair = panel.renderer().pending_pair().unwrap();
        panel.act(UserAction::Answer {
            pair,
            answer: Answer::Yes,
        });
        assert_layout_current(&panel);

        panel.resize(30, 5);
        assert_layout_current(&panel);

        panel.receive_message(InboundMessage::Reset);
        assert_layout_current(&panel);
        assert!(panel.lines().is_empty());

        panel.receive_message(InboundMessage::line(Severity::Error, "Adapter missing"));
        assert_layout_current(&panel);
        assert_eq!(panel.lines().len(), 1);
    }

    #[test]
    fn test_long_session_stays_pinned() {
        let mut panel = panel(40, 10);
        fill(&mut panel, 3000);
        assert!((panel.content_height() - 3000.0).abs() < f64::EPSILON);
        assert!((panel.scroll_top() - 2990.0).abs() < f64::EPSILON);
        assert_layout_current(&panel);
    }

    #[test]
    fn test_rejected_frame_keeps_running_marker() {
        let mut panel = panel(40, 10);
        panel.receive_message(InboundMessage::feedback("Scanning"));
        let running = panel.renderer().running_turn();
        assert!(running.is_some());

        assert!(panel.receive(r#"{"type":"progress","content":"50%"}"#).is_err());
        assert_eq!(panel.renderer().running_turn(), running);

        panel.receive_message(InboundMessage::line(Severity::User, "ok"));
        assert_eq!(panel.renderer().running_turn(), None);
    }

    #[tokio::test]
    async fn test_run_handles_frames_in_order() {
        let (mut bridge, mut host) = bridge::channel();
        let mut panel = Panel::headless(&PanelConfig::default(), bridge.sender()).unwrap();

        host.post(&InboundMessage::feedback("Checking"));
        host.post_raw(r#"{"type":"nope"}"#);
        host.post(&InboundMessage::Reset);
        host.post(&InboundMessage::line(Severity::Assistance, "Hello again"));
        drop(host);

        let summary = panel.run(&mut bridge).await;
        assert_eq!(
            summary,
            RunSummary {
                handled: 3,
                rejected: 1
            }
        );
        assert_eq!(panel.renderer().transcript(), vec!["[assistance] Hello again"]);
    }
}
