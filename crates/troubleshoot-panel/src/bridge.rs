//! Host bridge: the panel's only channel to the host.
//!
//! Sending is fire-and-forget through [`HostSender`]. Receiving yields raw
//! frames in arrival order; decoding happens in the panel so protocol
//! violations can be rejected per message.

use tokio::sync::mpsc;

use crate::protocol::{InboundMessage, OutboundMessage};

/// Sink for outbound messages.
pub trait HostSender {
    /// Send a message. No acknowledgement, no delivery guarantee.
    fn send(&mut self, message: OutboundMessage);
}

/// Records messages in order. Used by replay and tests.
impl HostSender for Vec<OutboundMessage> {
    fn send(&mut self, message: OutboundMessage) {
        self.push(message);
    }
}

impl HostSender for mpsc::UnboundedSender<OutboundMessage> {
    fn send(&mut self, message: OutboundMessage) {
        let tag = message.tag();
        if mpsc::UnboundedSender::send(self, message).is_err() {
            tracing::warn!(tag, "host channel closed, dropping outbound message");
        } else {
            tracing::debug!(tag, "sent outbound message");
        }
    }
}

/// Panel side of the host channel.
#[derive(Debug)]
pub struct HostBridge {
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    inbound: mpsc::UnboundedReceiver<String>,
}

/// Host side of the host channel.
#[derive(Debug)]
pub struct HostEndpoint {
    inbound: mpsc::UnboundedSender<String>,
    outbound: mpsc::UnboundedReceiver<OutboundMessage>,
}

/// Create a connected bridge / endpoint pair.
pub fn channel() -> (HostBridge, HostEndpoint) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    (
        HostBridge {
            outbound: outbound_tx,
            inbound: inbound_rx,
        },
        HostEndpoint {
            inbound: inbound_tx,
            outbound: outbound_rx,
        },
    )
}

impl HostBridge {
    /// A sender for outbound messages.
    pub fn sender(&self) -> mpsc::UnboundedSender<OutboundMessage> {
        self.outbound.clone()
    }

    /// Wait for the next raw inbound frame. `None` once the host is gone.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Take the next frame if one is already queued.
    pub fn try_next_frame(&mut self) -> Option<String> {
        self.inbound.try_recv().ok()
    }

    /// Split into the outbound sender and the inbound frame receiver.
    pub fn split(
        self,
    ) -> (
        mpsc::UnboundedSender<OutboundMessage>,
        mpsc::UnboundedReceiver<String>,
    ) {
        (self.outbound, self.inbound)
    }
}

impl HostEndpoint {
    /// Post a typed message to the panel.
    ///
    /// Returns `true` if the panel is still listening.
    pub fn post(&self, message: &InboundMessage) -> bool {
        self.post_raw(message.to_json())
    }

    /// Post a raw frame to the panel, malformed or not.
    pub fn post_raw(&self, frame: impl Into<String>) -> bool {
        self.inbound.send(frame.into()).is_ok()
    }

    /// Wait for the next outbound message from the panel.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.outbound.recv().await
    }

    /// Take the next outbound message if one is already queued.
    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        self.outbound.try_recv().ok()
    }

    /// Split into the inbound frame sender and the outbound receiver.
    pub fn split(
        self,
    ) -> (
        mpsc::UnboundedSender<String>,
        mpsc::UnboundedReceiver<OutboundMessage>,
    ) {
        (self.inbound, self.outbound)
    }
}
