use serde_json::json;

use super::rules::{self, DispatchRule};
use super::CORE_JS_VERSION;
use crate::module::{DepMap, Module};
use crate::transformer::{TransformerBinding, BABEL, CSS, REACT_REFRESH, STYLE};

pub const REACT_REFRESH_VERSION: &str = "^0.11.0";

pub const TRANSFORMERS: &[&str] = &[BABEL, REACT_REFRESH, CSS, STYLE];

pub const DEFAULT_HTML_BODY: &str = r#"<div id="root"></div>"#;

pub static RULES: [DispatchRule; 3] = [
    DispatchRule {
        name: "app-script",
        matches: rules::is_app_script,
        chain: app_script_chain,
    },
    DispatchRule {
        name: "library-script",
        matches: rules::is_library_script,
        chain: library_script_chain,
    },
    DispatchRule {
        name: "stylesheet",
        matches: rules::is_stylesheet,
        chain: rules::stylesheet_chain,
    },
];

fn app_script_chain(_module: &Module) -> Vec<TransformerBinding> {
    vec![
        TransformerBinding::with_options(
            BABEL,
            json!({
                "presets": [["react", { "runtime": "automatic" }]],
                "plugins": [["react-refresh/babel", { "skipEnvCheck": true }]],
            }),
        ),
        TransformerBinding::bare(REACT_REFRESH),
    ]
}

fn library_script_chain(_module: &Module) -> Vec<TransformerBinding> {
    vec![TransformerBinding::bare(BABEL)]
}

pub fn augment_dependencies(mut deps: DepMap) -> DepMap {
    deps.entry("react-refresh".to_string())
        .or_insert_with(|| REACT_REFRESH_VERSION.to_string());
    deps.insert("core-js".to_string(), CORE_JS_VERSION.to_string());
    deps
}
