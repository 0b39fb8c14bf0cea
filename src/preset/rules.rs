//! Ordered file-path dispatch shared by every preset.
//!
//! Each preset declares a table of [`DispatchRule`]s. Rules are written to be
//! mutually exclusive; [`dispatch`] still checks every rule so an overlap
//! shows up as an error instead of silently depending on table order.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::BundlerError;
use crate::module::Module;
use crate::transformer::{TransformerBinding, CSS, STYLE};

pub struct DispatchRule {
    pub name: &'static str,
    pub matches: fn(&Module) -> bool,
    pub chain: fn(&Module) -> Vec<TransformerBinding>,
}

/// Run the rule table against one module. Exactly one rule must match and
/// its chain must be non-empty.
pub fn dispatch(
    rules: &[DispatchRule],
    module: &Module,
) -> Result<Vec<TransformerBinding>, BundlerError> {
    let matched: Vec<&DispatchRule> = rules.iter().filter(|r| (r.matches)(module)).collect();

    let rule = match matched.as_slice() {
        [] => {
            return Err(BundlerError::NoTransformer {
                path: module.filepath.clone(),
            })
        }
        [rule] => *rule,
        _ => {
            return Err(BundlerError::AmbiguousTransformer {
                path: module.filepath.clone(),
                rules: matched.iter().map(|r| r.name.to_string()).collect(),
            })
        }
    };

    let chain = (rule.chain)(module);
    if chain.is_empty() {
        return Err(BundlerError::NoTransformer {
            path: module.filepath.clone(),
        });
    }
    Ok(chain)
}

// ── Path classification ─────────────────────────────────────────────

#[allow(clippy::expect_used)] // literal patterns
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(m|c)?(j|t)sx?$").expect("script pattern"));

#[allow(clippy::expect_used)]
static APP_SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(((m|c)?jsx?)|tsx)$").expect("app script pattern"));

#[allow(clippy::expect_used)]
static DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.d\.(m|c)?ts$").expect("declaration pattern"));

#[allow(clippy::expect_used)]
static STYLESHEET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.css$").expect("stylesheet pattern"));

/// Project JavaScript/JSX/TSX that gets fast-refresh instrumentation.
pub fn is_app_script(module: &Module) -> bool {
    !module.is_node_module() && APP_SCRIPT_RE.is_match(&module.filepath)
}

/// Any compilable script, excluding type declarations.
pub fn is_script(module: &Module) -> bool {
    SCRIPT_RE.is_match(&module.filepath) && !DECLARATION_RE.is_match(&module.filepath)
}

/// Scripts that are not app scripts: dependencies and plain `.ts` files.
pub fn is_library_script(module: &Module) -> bool {
    is_script(module) && !is_app_script(module)
}

pub fn is_stylesheet(module: &Module) -> bool {
    STYLESHEET_RE.is_match(&module.filepath)
}

/// CSS is rewritten first, then injected as a style tag.
pub fn stylesheet_chain(_module: &Module) -> Vec<TransformerBinding> {
    vec![TransformerBinding::bare(CSS), TransformerBinding::bare(STYLE)]
}
