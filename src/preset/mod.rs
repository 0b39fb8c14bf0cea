pub mod react;
pub mod registry;
pub mod rules;
pub mod solid;
pub mod vanilla;

use std::fmt;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::BundlerBackend;
use crate::error::BundlerError;
use crate::module::{DepMap, Module};
use crate::transformer::{TransformerBinding, TransformerSet};

pub use registry::PresetRegistry;
use rules::DispatchRule;

/// Version every preset pins for the polyfill runtime.
pub const CORE_JS_VERSION: &str = "3.22.7";

/// A project template: which transformers it needs, how files map onto
/// them, and which support packages it adds to the project's dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    React,
    Solid,
    Vanilla,
}

impl Preset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Solid => "solid",
            Self::Vanilla => "vanilla",
        }
    }

    pub fn all() -> &'static [Preset] {
        &[Self::React, Self::Solid, Self::Vanilla]
    }

    /// Transformer instances `init` must register.
    pub fn transformer_names(&self) -> &'static [&'static str] {
        match self {
            Self::React => react::TRANSFORMERS,
            Self::Solid => solid::TRANSFORMERS,
            Self::Vanilla => vanilla::TRANSFORMERS,
        }
    }

    fn rules(&self) -> &'static [DispatchRule] {
        match self {
            Self::React => &react::RULES,
            Self::Solid => &solid::RULES,
            Self::Vanilla => &vanilla::RULES,
        }
    }

    /// Ordered transformer chain for one module. Fails when no rule claims
    /// the file; never returns an empty chain.
    pub fn map_transformers(
        &self,
        module: &Module,
    ) -> Result<Vec<TransformerBinding>, BundlerError> {
        rules::dispatch(self.rules(), module)
    }

    /// Add the packages this preset's transformers rely on at runtime.
    /// Only sets keys, so applying it twice equals applying it once.
    pub fn augment_dependencies(&self, deps: DepMap) -> DepMap {
        match self {
            Self::React => react::augment_dependencies(deps),
            Self::Solid => solid::augment_dependencies(deps),
            Self::Vanilla => vanilla::augment_dependencies(deps),
        }
    }

    /// Body markup used when the project ships no `index.html`.
    pub fn default_html_body(&self) -> &'static str {
        match self {
            Self::React => react::DEFAULT_HTML_BODY,
            Self::Solid => solid::DEFAULT_HTML_BODY,
            Self::Vanilla => vanilla::DEFAULT_HTML_BODY,
        }
    }

    /// Load every transformer this preset needs. Loads run concurrently and
    /// the preset is ready only if all of them succeed.
    pub async fn init(self, backend: &dyn BundlerBackend) -> Result<ActivePreset, BundlerError> {
        let loads = self.transformer_names().iter().map(|&name| async move {
            debug!(preset = self.name(), transformer = name, "loading transformer");
            backend
                .load_transformer(name)
                .await
                .map_err(|e| BundlerError::PresetInit {
                    preset: self.name().to_string(),
                    message: format!("{name}: {e}"),
                })
        });
        let transformers: TransformerSet = try_join_all(loads).await?.into_iter().collect();

        info!(
            preset = self.name(),
            transformers = transformers.len(),
            "preset initialized"
        );
        Ok(ActivePreset {
            preset: self,
            transformers,
        })
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A preset whose `init` completed. Chains can only be resolved against an
/// `ActivePreset`, so resolution never sees a half-registered preset.
#[derive(Debug, Clone)]
pub struct ActivePreset {
    preset: Preset,
    transformers: TransformerSet,
}

impl ActivePreset {
    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn transformers(&self) -> &TransformerSet {
        &self.transformers
    }

    /// The module's chain, checked against the registered instances.
    pub fn chain_for(&self, module: &Module) -> Result<Vec<TransformerBinding>, BundlerError> {
        let chain = self.preset.map_transformers(module)?;
        if let Some(missing) = chain.iter().find(|b| !self.transformers.contains(&b.name)) {
            return Err(BundlerError::TransformerNotRegistered {
                preset: self.preset.name().to_string(),
                name: missing.name.clone(),
            });
        }
        Ok(chain)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::FakeBackend;
    use crate::transformer::{BABEL, CSS, REACT_REFRESH, SOLID_REFRESH, STYLE};

    fn names(chain: &[TransformerBinding]) -> Vec<&str> {
        chain.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn react_jsx_gets_transform_then_refresh() {
        let chain = Preset::React
            .map_transformers(&Module::new("/a.jsx", "<App/>"))
            .unwrap();
        assert_eq!(names(&chain), vec![BABEL, REACT_REFRESH]);
        assert_eq!(
            chain[0].options["plugins"][0][0],
            serde_json::json!("react-refresh/babel")
        );
    }

    #[test]
    fn unknown_extension_names_the_file() {
        for preset in Preset::all() {
            let err = preset
                .map_transformers(&Module::new("/a.unknownext", ""))
                .unwrap_err();
            assert_eq!(
                err,
                BundlerError::NoTransformer {
                    path: "/a.unknownext".into()
                }
            );
        }
    }

    #[test]
    fn stylesheet_is_rewritten_then_injected() {
        for preset in Preset::all() {
            let chain = preset
                .map_transformers(&Module::new("/styles.css", "body {}"))
                .unwrap();
            assert_eq!(names(&chain), vec![CSS, STYLE]);
        }
    }

    #[test]
    fn dependencies_and_typescript_skip_refresh() {
        let dep = Preset::React
            .map_transformers(&Module::new("/node_modules/lib/index.js", ""))
            .unwrap();
        assert_eq!(names(&dep), vec![BABEL]);
        assert!(dep[0].options.is_empty());

        let ts = Preset::Solid
            .map_transformers(&Module::new("/src/util.ts", ""))
            .unwrap();
        assert_eq!(names(&ts), vec![BABEL]);
    }

    #[test]
    fn solid_app_script_uses_solid_refresh() {
        let chain = Preset::Solid
            .map_transformers(&Module::new("/src/App.tsx", ""))
            .unwrap();
        assert_eq!(names(&chain), vec![BABEL, SOLID_REFRESH]);
    }

    #[test]
    fn no_sample_path_is_ambiguous() {
        let paths = [
            "/index.js",
            "/src/App.jsx",
            "/src/App.tsx",
            "/src/util.ts",
            "/src/util.mts",
            "/node_modules/react/index.js",
            "/node_modules/lib/index.tsx",
            "/styles.css",
            "/node_modules/lib/style.css",
        ];
        for preset in Preset::all() {
            for path in paths {
                let result = preset.map_transformers(&Module::new(path, ""));
                assert!(result.is_ok(), "{preset} failed on {path}: {result:?}");
            }
        }
    }

    #[test]
    fn declarations_have_no_transformer() {
        let err = Preset::React
            .map_transformers(&Module::new("/src/types.d.ts", ""))
            .unwrap_err();
        assert!(matches!(err, BundlerError::NoTransformer { .. }));
    }

    #[test]
    fn augment_is_idempotent_and_keeps_caller_pins() {
        let mut deps = DepMap::new();
        deps.insert("react".into(), "^18.2.0".into());
        deps.insert("react-refresh".into(), "0.14.0".into());
        deps.insert("core-js".into(), "2.0.0".into());

        for preset in Preset::all() {
            let once = preset.augment_dependencies(deps.clone());
            let twice = preset.augment_dependencies(once.clone());
            assert_eq!(once, twice, "{preset} is not idempotent");
            for key in deps.keys() {
                assert!(once.contains_key(key), "{preset} dropped {key}");
            }
            assert_eq!(once["core-js"], CORE_JS_VERSION);
        }

        let react = Preset::React.augment_dependencies(deps);
        assert_eq!(react["react-refresh"], "0.14.0");
    }

    #[test]
    fn augment_adds_refresh_runtime_when_absent() {
        let react = Preset::React.augment_dependencies(DepMap::new());
        assert_eq!(react["react-refresh"], react::REACT_REFRESH_VERSION);
        let solid = Preset::Solid.augment_dependencies(DepMap::new());
        assert_eq!(solid["solid-refresh"], solid::SOLID_REFRESH_VERSION);
        let vanilla = Preset::Vanilla.augment_dependencies(DepMap::new());
        assert_eq!(vanilla.len(), 1);
    }

    #[tokio::test]
    async fn init_registers_every_transformer() {
        let backend = FakeBackend::new();
        let active = Preset::React.init(&backend).await.unwrap();
        assert_eq!(active.transformers().len(), react::TRANSFORMERS.len());
        let chain = active.chain_for(&Module::new("/a.jsx", "")).unwrap();
        assert_eq!(names(&chain), vec![BABEL, REACT_REFRESH]);
    }

    #[tokio::test(start_paused = true)]
    async fn init_loads_transformers_concurrently() {
        let backend = FakeBackend::new().load_delay(Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        let active = Preset::React.init(&backend).await.unwrap();

        assert_eq!(active.transformers().len(), react::TRANSFORMERS.len());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(200), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn init_fails_when_one_load_fails() {
        let backend = FakeBackend::new().failing_transformer(REACT_REFRESH);
        let err = Preset::React.init(&backend).await.unwrap_err();
        assert!(
            matches!(
                &err,
                BundlerError::PresetInit { preset, message }
                    if preset == "react" && message.contains(REACT_REFRESH)
            ),
            "unexpected error: {err:?}"
        );
    }
}
