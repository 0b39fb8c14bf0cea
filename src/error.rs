use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in a source file, as reported by a transformer or by the
/// evaluated program's source maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct SourceLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub line: u32,
    pub column: u32,
}

/// Structured error type for the bundler core. The host matches on `code`
/// to decide how to surface it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum BundlerError {
    /// No dispatch rule of the active preset matches the file.
    NoTransformer { path: String },
    /// More than one dispatch rule claims the file.
    AmbiguousTransformer { path: String, rules: Vec<String> },
    /// A chain names a transformer the active preset never registered.
    TransformerNotRegistered { preset: String, name: String },
    /// A transformer failed to load while the preset was initializing.
    PresetInit { preset: String, message: String },
    /// A transformer or the module graph rejected the source.
    Compilation {
        message: String,
        location: Option<SourceLocation>,
    },
    /// `/package.json` could not be read as a manifest.
    InvalidManifest { message: String },
    /// The backend failed for a reason unrelated to any one file.
    Build { message: String },
    /// The produced program threw while being evaluated.
    Evaluation {
        message: String,
        location: Option<SourceLocation>,
    },
    /// A devtools integration could not be loaded.
    IntegrationLoad { message: String },
    InvalidConfig { message: String },
    IoError { message: String },
}

impl BundlerError {
    pub fn compilation(message: impl Into<String>) -> Self {
        BundlerError::Compilation {
            message: message.into(),
            location: None,
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        BundlerError::Evaluation {
            message: message.into(),
            location: None,
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        BundlerError::Build {
            message: message.into(),
        }
    }

    /// Location attached to the error, if the producer knew one.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            BundlerError::Compilation { location, .. }
            | BundlerError::Evaluation { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// File the error is about, falling back to the location's path.
    pub fn path(&self) -> Option<&str> {
        match self {
            BundlerError::NoTransformer { path }
            | BundlerError::AmbiguousTransformer { path, .. } => Some(path),
            _ => self.location().and_then(|l| l.path.as_deref()),
        }
    }
}

impl fmt::Display for BundlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundlerError::NoTransformer { path } => write!(f, "No transformer for {path}"),
            BundlerError::AmbiguousTransformer { path, rules } => write!(
                f,
                "Ambiguous transformer for {path}: matched rules {}",
                rules.join(", ")
            ),
            BundlerError::TransformerNotRegistered { preset, name } => {
                write!(f, "Transformer {name} is not registered in preset {preset}")
            }
            BundlerError::PresetInit { preset, message } => {
                write!(f, "Failed to initialize preset {preset}: {message}")
            }
            BundlerError::Compilation { message, .. } => write!(f, "{message}"),
            BundlerError::InvalidManifest { message } => {
                write!(f, "Invalid package.json: {message}")
            }
            BundlerError::Build { message } => write!(f, "{message}"),
            BundlerError::Evaluation { message, .. } => write!(f, "{message}"),
            BundlerError::IntegrationLoad { message } => {
                write!(f, "Failed to load integration: {message}")
            }
            BundlerError::InvalidConfig { message } => write!(f, "Invalid config: {message}"),
            BundlerError::IoError { message } => write!(f, "I/O error: {message}"),
        }
    }
}

impl std::error::Error for BundlerError {}

impl From<std::io::Error> for BundlerError {
    fn from(e: std::io::Error) -> Self {
        BundlerError::IoError {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for BundlerError {
    fn from(e: serde_json::Error) -> Self {
        BundlerError::InvalidManifest {
            message: e.to_string(),
        }
    }
}
