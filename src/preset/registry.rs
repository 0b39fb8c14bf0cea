use indexmap::IndexMap;
use tracing::warn;

use super::Preset;

/// Template name → preset. Built once at startup and handed to the
/// orchestrator; lookups never fail.
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: IndexMap<String, Preset>,
    default: Preset,
}

impl PresetRegistry {
    /// Empty registry that resolves everything to `default`.
    pub fn new(default: Preset) -> Self {
        Self {
            presets: IndexMap::new(),
            default,
        }
    }

    /// Registry holding every built-in preset under its own name, with React
    /// as the fallback.
    pub fn builtin() -> Self {
        let mut registry = Self::new(Preset::React);
        for preset in Preset::all() {
            registry.register(preset.name(), *preset);
        }
        registry
    }

    /// Register `preset` under `name`, returning whatever was registered
    /// there before. Aliases are allowed.
    pub fn register(&mut self, name: impl Into<String>, preset: Preset) -> Option<Preset> {
        self.presets.insert(name.into(), preset)
    }

    pub fn set_default(&mut self, preset: Preset) {
        self.default = preset;
    }

    pub fn default_preset(&self) -> Preset {
        self.default
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Preset registered under `name`, or the default one. Falling back is
    /// logged so a misspelled template is diagnosable.
    pub fn get(&self, name: &str) -> Preset {
        if let Some(preset) = self.presets.get(name) {
            return *preset;
        }
        warn!(
            template = name,
            fallback = self.default.name(),
            "unknown preset, falling back to default"
        );
        self.default
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
