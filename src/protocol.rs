//! Envelopes exchanged with the host: `{ "type": ..., "payload": ... }`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SourceLocation;
use crate::logging::LogLevel;
use crate::module::Module;

// ── Inbound ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum InboundMessage {
    Compile(CompileRequest),
    Refresh,
    Evaluate { command: String },
}

/// Which devtools build the host wants injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum DevToolsKind {
    Legacy,
    Latest,
}

/// A file as the host sends it: bare source, or an object carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestModule {
    Source(String),
    File {
        #[serde(alias = "code")]
        source: String,
    },
}

impl RequestModule {
    pub fn source(&self) -> &str {
        match self {
            Self::Source(source) | Self::File { source } => source,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    pub modules: IndexMap<String, RequestModule>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub log_level: Option<LogLevel>,
    #[serde(default)]
    pub has_file_resolver: bool,
    #[serde(default)]
    pub react_dev_tools: Option<DevToolsKind>,
}

impl CompileRequest {
    pub fn new(template: &str) -> Self {
        Self {
            template: Some(template.to_string()),
            ..Self::default()
        }
    }

    pub fn with_module(mut self, path: &str, source: &str) -> Self {
        self.modules
            .insert(path.to_string(), RequestModule::Source(source.to_string()));
        self
    }

    /// Modules in the order the host listed them.
    pub fn modules(&self) -> Vec<Module> {
        self.modules
            .iter()
            .map(|(path, m)| Module::new(path.clone(), m.source()))
            .collect()
    }
}

// ── Outbound ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum CompileStatus {
    Initializing,
    Evaluating,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorAction {
    #[serde(rename = "show-error")]
    ShowError,
}

/// The one error surface the host shows for a failed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowErrorAction {
    pub action: ErrorAction,
    pub title: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub path: Option<String>,
    pub message: String,
    pub payload: Value,
}

impl ShowErrorAction {
    pub fn new(title: &str, message: String, location: Option<&SourceLocation>) -> Self {
        Self {
            action: ErrorAction::ShowError,
            title: title.to_string(),
            line: location.map(|l| l.line),
            column: location.map(|l| l.column),
            path: location.and_then(|l| l.path.clone()),
            message,
            payload: Value::Null,
        }
    }
}

/// One console call forwarded from the running program, or the result of
/// an `evaluate` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLog {
    pub method: String,
    pub data: Vec<Value>,
}

impl ConsoleLog {
    pub fn new(method: &str, data: Vec<Value>) -> Self {
        Self {
            method: method.to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum OutboundMessage {
    Initialized,
    Start { first_load: bool },
    Status { status: CompileStatus },
    Done { compilation_error: bool },
    Action(ShowErrorAction),
    Success,
    Console { log: Vec<ConsoleLog> },
    Resize { height: u32 },
    Refresh,
}

impl OutboundMessage {
    /// The envelope `type` this message is sent under.
    pub fn kind(&self) -> &'static str {
        use crate::events;
        match self {
            Self::Initialized => events::INITIALIZED,
            Self::Start { .. } => events::START,
            Self::Status { .. } => events::STATUS,
            Self::Done { .. } => events::DONE,
            Self::Action(_) => events::ACTION,
            Self::Success => events::SUCCESS,
            Self::Console { .. } => events::CONSOLE,
            Self::Resize { .. } => events::RESIZE,
            Self::Refresh => events::REFRESH,
        }
    }
}
