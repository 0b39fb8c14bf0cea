use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BundlerError;
use crate::module::Module;

pub type TransformerOptions = Map<String, Value>;

// ── Transformer names ───────────────────────────────────────────────

pub const BABEL: &str = "babel-transformer";
pub const REACT_REFRESH: &str = "react-refresh-transformer";
pub const SOLID_REFRESH: &str = "solid-refresh-transformer";
pub const CSS: &str = "css-transformer";
pub const STYLE: &str = "style-transformer";

/// One step of a module's chain: which transformer to run and with what
/// options. Chains run in list order, each step consuming the previous
/// step's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct TransformerBinding {
    pub name: String,
    #[cfg_attr(feature = "ts-bindings", ts(type = "Record<string, unknown>"))]
    pub options: TransformerOptions,
}

impl TransformerBinding {
    /// Binding with no options.
    pub fn bare(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: Map::new(),
        }
    }

    /// Binding whose options are given as a JSON object literal. Non-object
    /// values are ignored.
    pub fn with_options(name: &str, options: Value) -> Self {
        let options = match options {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.to_string(),
            options,
        }
    }
}

/// A loaded transformer. Concrete implementations live in the backend; the
/// core only selects them by name and runs them in chain order.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &str;

    fn transform(
        &self,
        module: Module,
        options: &TransformerOptions,
    ) -> Result<Module, BundlerError>;
}

/// The transformer instances a preset registered during `init`.
#[derive(Clone, Default)]
pub struct TransformerSet {
    instances: IndexMap<String, Arc<dyn Transformer>>,
}

impl TransformerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, transformer: Arc<dyn Transformer>) {
        self.instances
            .insert(transformer.name().to_string(), transformer);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transformer>> {
        self.instances.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl fmt::Debug for TransformerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.instances.keys()).finish()
    }
}

impl FromIterator<Arc<dyn Transformer>> for TransformerSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Transformer>>>(iter: I) -> Self {
        let mut set = Self::new();
        for transformer in iter {
            set.register(transformer);
        }
        set
    }
}

/// Transformer that returns its input untouched. Used by the headless
/// backend, which plans compiles without transpiling anything.
#[derive(Debug, Clone)]
pub struct PassThrough {
    name: String,
}

impl PassThrough {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Transformer for PassThrough {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(
        &self,
        module: Module,
        _options: &TransformerOptions,
    ) -> Result<Module, BundlerError> {
        Ok(module)
    }
}
