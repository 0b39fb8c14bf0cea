use std::io::Write;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::protocol::{CompileStatus, OutboundMessage};

// ── HostChannel trait ───────────────────────────────────────────────

/// Abstraction over the outbound half of the host channel. Sending never
/// fails from the caller's point of view; a broken channel is logged.
pub trait HostChannel: Send + Sync {
    fn send(&self, message: OutboundMessage);
}

/// Writes one JSON envelope per line. Used by the CLI over stdout.
pub struct JsonLinesChannel<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesChannel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> HostChannel for JsonLinesChannel<W> {
    fn send(&self, message: OutboundMessage) {
        let line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(e) => {
                warn!(kind = message.kind(), "failed to encode message: {e}");
                return;
            }
        };
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(kind = message.kind(), "failed to write message: {e}");
        }
    }
}

/// Forwards messages into a tokio channel for an embedding host.
pub struct MpscChannel {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl MpscChannel {
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl HostChannel for MpscChannel {
    fn send(&self, message: OutboundMessage) {
        if let Err(e) = self.sender.send(message) {
            warn!(kind = e.0.kind(), "host channel closed, dropping message");
        }
    }
}

/// Keeps every message in memory, in send order.
#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().clone()
    }

    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Envelope types in send order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.messages.lock().iter().map(OutboundMessage::kind).collect()
    }

    /// Every status value sent so far.
    pub fn statuses(&self) -> Vec<CompileStatus> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::Status { status } => Some(*status),
                _ => None,
            })
            .collect()
    }
}

impl HostChannel for RecordingChannel {
    fn send(&self, message: OutboundMessage) {
        self.messages.lock().push(message);
    }
}
