//! troubleshoot-panel: Headless conversation panel for troubleshooting hosts
//!
//! The panel renders a troubleshooting conversation driven entirely by
//! messages from an external host. This crate provides:
//! - The wire protocol in both directions
//! - An element tree with a one-call element builder
//! - The conversation renderer state machine
//! - Sticky scrolling for the conversation region
//! - Host bridges over in-process channels or a child process

pub mod bridge;
pub mod config;
pub mod element;
pub mod host;
pub mod layout;
pub mod panel;
pub mod protocol;
pub mod renderer;
pub mod scroll;

// Re-export commonly used types
pub use bridge::{channel, HostBridge, HostEndpoint, HostSender};
pub use config::{ConfigError, PanelConfig};
pub use element::{element, Document, Element, Node, NodeId, Tag};
pub use host::{HostError, HostProcess};
pub use layout::{layout_region, layout_turns, LayoutLine, Segment};
pub use panel::{build_layout, BootstrapError, Panel, RunSummary};
pub use protocol::{
    InboundMessage, InputKind, OutboundMessage, PromptValue, ProtocolError, Severity,
};
pub use renderer::{
    Answer, AnswerState, ConversationRenderer, Handled, InputState, PairId, Regions, UserAction,
    YesNoPair,
};
pub use scroll::{with_sticky_scroll, Scrollable, Viewport, BOTTOM_TOLERANCE};

/// Returns the panel crate version.
pub fn panel_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
