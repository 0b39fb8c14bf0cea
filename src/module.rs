use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::BundlerError;

/// Package name → version range the backend must install before evaluation.
pub type DepMap = IndexMap<String, String>;

pub const PACKAGE_JSON: &str = "/package.json";

/// Host-supplied document markup, in lookup order.
pub const HTML_ENTRIES: &[&str] = &["/index.html", "/public/index.html"];

/// One source file handed to the compile. Identity is the file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct Module {
    pub filepath: String,
    pub source: String,
}

impl Module {
    pub fn new(filepath: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            source: source.into(),
        }
    }

    pub fn is_node_module(&self) -> bool {
        self.filepath.starts_with("/node_modules/")
    }

    /// Files the core reads itself instead of handing to a transformer.
    pub fn is_project_metadata(&self) -> bool {
        self.filepath == PACKAGE_JSON || HTML_ENTRIES.contains(&self.filepath.as_str())
    }
}

// ── package.json ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    dependencies: DepMap,
    #[serde(default)]
    dev_dependencies: DepMap,
}

/// Dependencies and entry declared by the project's `/package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifest {
    pub entry: Option<String>,
    pub dependencies: DepMap,
}

impl ProjectManifest {
    /// Read `/package.json` from the request's modules. A missing manifest
    /// yields an empty one; a malformed manifest is an error.
    pub fn from_modules(modules: &[Module]) -> Result<Self, BundlerError> {
        let Some(manifest) = modules.iter().find(|m| m.filepath == PACKAGE_JSON) else {
            return Ok(Self::default());
        };
        let parsed: PackageManifest = serde_json::from_str(&manifest.source)?;

        // devDependencies never shadow a runtime dependency
        let mut dependencies = parsed.dependencies;
        for (name, range) in parsed.dev_dependencies {
            dependencies.entry(name).or_insert(range);
        }

        Ok(Self {
            entry: parsed.main.map(|main| normalize_entry(&main)),
            dependencies,
        })
    }
}

fn normalize_entry(main: &str) -> String {
    let trimmed = main.trim_start_matches("./");
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
