use serde::Serialize;
use tracing::info;

use crate::backend::BundlerBackend;
use crate::error::BundlerError;
use crate::module::{DepMap, Module, ProjectManifest};
use crate::preset::{ActivePreset, Preset};
use crate::resolver::{self, ResolvedModule};
use crate::transformer::TransformerSet;

/// Everything the backend needs to build the program: each module with its
/// chain, the augmented dependency manifest and the transformer instances.
#[derive(Debug, Clone)]
pub struct CompilePlan {
    pub preset: Preset,
    pub entry: Option<String>,
    pub modules: Vec<ResolvedModule>,
    pub dependencies: DepMap,
    pub transformers: TransformerSet,
}

/// What the backend produced. The core only hands it back for evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledProgram {
    pub entry: Option<String>,
    pub modules: Vec<Module>,
    pub dependencies: DepMap,
}

/// Resolve chains for every source module and settle dependencies. Project
/// metadata (`package.json`, the HTML entry) is read here, not compiled.
pub fn plan(preset: &ActivePreset, modules: Vec<Module>) -> Result<CompilePlan, BundlerError> {
    let manifest = ProjectManifest::from_modules(&modules)?;
    let sources: Vec<Module> = modules
        .into_iter()
        .filter(|m| !m.is_project_metadata())
        .collect();
    let resolved = resolver::resolve_all(preset, sources)?;
    let dependencies = preset.preset().augment_dependencies(manifest.dependencies);

    Ok(CompilePlan {
        preset: preset.preset(),
        entry: manifest.entry,
        modules: resolved,
        dependencies,
        transformers: preset.transformers().clone(),
    })
}

pub async fn compile(
    preset: &ActivePreset,
    modules: Vec<Module>,
    backend: &dyn BundlerBackend,
) -> Result<CompiledProgram, BundlerError> {
    let plan = plan(preset, modules)?;
    info!(
        preset = %plan.preset,
        modules = plan.modules.len(),
        dependencies = plan.dependencies.len(),
        "compiling"
    );
    backend.build(plan).await
}
