use serde::Serialize;
use tracing::debug;

use crate::error::BundlerError;
use crate::module::Module;
use crate::preset::ActivePreset;
use crate::transformer::{TransformerBinding, TransformerSet};

/// A module paired with the chain that will compile it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedModule {
    pub module: Module,
    pub chain: Vec<TransformerBinding>,
}

impl ResolvedModule {
    /// Run the chain in order, feeding each transformer the previous output.
    pub fn apply(&self, transformers: &TransformerSet) -> Result<Module, BundlerError> {
        let mut current = self.module.clone();
        for binding in &self.chain {
            let transformer =
                transformers
                    .get(&binding.name)
                    .ok_or_else(|| BundlerError::TransformerNotRegistered {
                        preset: String::from("<active>"),
                        name: binding.name.clone(),
                    })?;
            current = transformer.transform(current, &binding.options)?;
        }
        Ok(current)
    }
}

/// Resolve every module against the active preset. The first module
/// without a chain fails the whole batch; there are no partial results.
pub fn resolve_all(
    preset: &ActivePreset,
    modules: Vec<Module>,
) -> Result<Vec<ResolvedModule>, BundlerError> {
    modules
        .into_iter()
        .map(|module| {
            let chain = preset.chain_for(&module)?;
            debug!(
                path = %module.filepath,
                chain = ?chain.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
                "resolved transformers"
            );
            Ok(ResolvedModule { module, chain })
        })
        .collect()
}
