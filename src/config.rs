use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BundlerError;
use crate::logging::LogLevel;
use crate::preset::{Preset, PresetRegistry};

/// Runtime settings for a sandbox. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Quiet window before a compile request starts.
    pub debounce_ms: u64,
    /// Height polling interval. 0 disables polling.
    pub resize_poll_ms: u64,
    /// Preset used when a request names no template or an unknown one.
    pub default_preset: Preset,
    pub log_level: LogLevel,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            resize_poll_ms: 300,
            default_preset: Preset::React,
            log_level: LogLevel::Info,
        }
    }
}

impl SandboxConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn resize_interval(&self) -> Option<Duration> {
        (self.resize_poll_ms > 0).then(|| Duration::from_millis(self.resize_poll_ms))
    }

    /// Built-in presets with this config's fallback.
    pub fn registry(&self) -> PresetRegistry {
        let mut registry = PresetRegistry::builtin();
        registry.set_default(self.default_preset);
        registry
    }
}

/// Load a config file. A missing file yields the defaults; an unreadable or
/// malformed one is an error.
pub fn load_config(path: &Path) -> Result<SandboxConfig, BundlerError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SandboxConfig::default()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&data).map_err(|e| BundlerError::InvalidConfig {
        message: format!("{}: {e}", path.display()),
    })
}
