//! Forwarding of events raised by the running program: uncaught errors and
//! console output.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::channel::HostChannel;
use crate::error::SourceLocation;
use crate::protocol::{ConsoleLog, OutboundMessage};
use crate::report::{ErrorDetail, ErrorRecord};

/// An uncaught error as the runtime saw it. `mapped` is the position in the
/// original source when a source map resolved one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeErrorEvent {
    pub message: String,
    pub path: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub mapped: Option<SourceLocation>,
}

impl RuntimeErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            line: None,
            column: None,
            mapped: None,
        }
    }

    pub fn to_record(&self) -> ErrorRecord {
        let detail = match &self.mapped {
            Some(location) => {
                ErrorDetail::new(self.message.clone(), self.path.as_deref(), Some(location))
            }
            None => ErrorDetail {
                message: self.message.clone(),
                path: self.path.clone(),
                line: self.line,
                column: self.column,
            },
        };
        ErrorRecord::RuntimeError(detail)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    Error(RuntimeErrorEvent),
    Console(Vec<ConsoleLog>),
}

pub type RuntimeEventSender = mpsc::UnboundedSender<RuntimeEvent>;
pub type RuntimeEventReceiver = mpsc::UnboundedReceiver<RuntimeEvent>;

pub fn runtime_events() -> (RuntimeEventSender, RuntimeEventReceiver) {
    mpsc::unbounded_channel()
}

/// Forward runtime events to the host until every sender is dropped.
pub fn spawn_listener(
    mut events: RuntimeEventReceiver,
    channel: Arc<dyn HostChannel>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                RuntimeEvent::Error(error) => {
                    debug!(message = %error.message, "runtime error");
                    channel.send(OutboundMessage::Action(error.to_record().to_action()));
                }
                RuntimeEvent::Console(log) if log.is_empty() => {}
                RuntimeEvent::Console(log) => channel.send(OutboundMessage::Console { log }),
            }
        }
        debug!("runtime event source closed");
    })
}
