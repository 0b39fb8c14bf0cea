use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::module::{Module, HTML_ENTRIES};
use crate::preset::Preset;

#[allow(clippy::expect_used)] // literal patterns
static HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head>").expect("head pattern"));

#[allow(clippy::expect_used)]
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*?)</body>").expect("body pattern"));

/// Head and body contents that replace the host document before the
/// program runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMarkup {
    pub head: Option<String>,
    pub body: String,
}

impl DocumentMarkup {
    /// Split an HTML document into head and body. Markup without a `<body>`
    /// element is treated as body content.
    pub fn from_html(html: &str) -> Self {
        let head = HEAD_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());
        let body = BODY_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map_or_else(|| html.trim().to_string(), |m| m.as_str().trim().to_string());
        Self { head, body }
    }

    /// The project's own `index.html` if it ships one, else the preset's
    /// default body.
    pub fn select(modules: &[Module], preset: Preset) -> Self {
        HTML_ENTRIES
            .iter()
            .find_map(|entry| modules.iter().find(|m| m.filepath == *entry))
            .map_or_else(
                || Self {
                    head: None,
                    body: preset.default_html_body().to_string(),
                },
                |m| Self::from_html(&m.source),
            )
    }
}
