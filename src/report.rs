//! Classification of errors into the records the host displays.

use serde::{Deserialize, Serialize};

use crate::error::{BundlerError, SourceLocation};
use crate::protocol::ShowErrorAction;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub path: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl ErrorDetail {
    pub fn new(message: String, path: Option<&str>, location: Option<&SourceLocation>) -> Self {
        Self {
            message,
            path: location
                .and_then(|l| l.path.clone())
                .or_else(|| path.map(str::to_string)),
            line: location.map(|l| l.line),
            column: location.map(|l| l.column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ErrorRecord {
    CompilationError(ErrorDetail),
    BundlerError(ErrorDetail),
    RuntimeError(ErrorDetail),
}

impl ErrorRecord {
    pub fn classify(error: &BundlerError) -> Self {
        let detail = ErrorDetail::new(error.to_string(), error.path(), error.location());
        match error {
            BundlerError::Compilation { .. } => Self::CompilationError(detail),
            BundlerError::Evaluation { .. } => Self::RuntimeError(detail),
            _ => Self::BundlerError(detail),
        }
    }

    pub fn detail(&self) -> &ErrorDetail {
        match self {
            Self::CompilationError(d) | Self::BundlerError(d) | Self::RuntimeError(d) => d,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::CompilationError(_) => "Compilation Error",
            Self::BundlerError(_) => "Bundler Error",
            Self::RuntimeError(_) => "Runtime Exception",
        }
    }

    pub fn to_action(&self) -> ShowErrorAction {
        let detail = self.detail();
        let mut action = ShowErrorAction::new(self.title(), detail.message.clone(), None);
        action.line = detail.line;
        action.column = detail.column;
        action.path = detail.path.clone();
        action.payload = serde_json::to_value(self).unwrap_or_default();
        action
    }
}
