use serde_json::json;

use super::rules::{self, DispatchRule};
use super::CORE_JS_VERSION;
use crate::module::{DepMap, Module};
use crate::transformer::{TransformerBinding, BABEL, CSS, STYLE};

pub const TRANSFORMERS: &[&str] = &[BABEL, CSS, STYLE];

pub const DEFAULT_HTML_BODY: &str = r#"<div id="app"></div>"#;

pub static RULES: [DispatchRule; 2] = [
    DispatchRule {
        name: "script",
        matches: rules::is_script,
        chain: script_chain,
    },
    DispatchRule {
        name: "stylesheet",
        matches: rules::is_stylesheet,
        chain: rules::stylesheet_chain,
    },
];

fn script_chain(_module: &Module) -> Vec<TransformerBinding> {
    vec![TransformerBinding::with_options(
        BABEL,
        json!({ "presets": [["env", { "targets": "defaults" }]] }),
    )]
}

pub fn augment_dependencies(mut deps: DepMap) -> DepMap {
    deps.insert("core-js".to_string(), CORE_JS_VERSION.to_string());
    deps
}
