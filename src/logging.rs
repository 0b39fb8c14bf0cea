use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Verbosity the host can request per compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    pub fn all() -> &'static [LogLevel] {
        &[
            Self::Off,
            Self::Error,
            Self::Warn,
            Self::Info,
            Self::Debug,
            Self::Trace,
        ]
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.as_directive().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Changes the active log filter at runtime. Library code only ever holds
/// one of these; the binary decides whether a subscriber exists at all.
#[derive(Clone, Default)]
pub struct LogControl {
    handle: Option<FilterHandle>,
}

impl LogControl {
    /// Control that ignores every request (no subscriber installed).
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_handle(handle: FilterHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub fn apply(&self, level: LogLevel) {
        let Some(handle) = &self.handle else {
            return;
        };
        match handle.modify(|filter| *filter = EnvFilter::new(level.as_directive())) {
            Ok(()) => debug!(level = level.as_directive(), "log level changed"),
            Err(e) => warn!("failed to change log level: {e}"),
        }
    }
}

/// Install the process-wide subscriber. `RUST_LOG` wins over `level` when
/// set. Output goes to stderr because stdout may carry the host channel.
pub fn init(level: LogLevel) -> LogControl {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();

    match installed {
        Ok(()) => LogControl::from_handle(handle),
        Err(_) => LogControl::disabled(),
    }
}
