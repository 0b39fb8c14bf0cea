//! Backend and document used when no real runtime is attached. Chains run
//! with pass-through transformers so resolution, manifests and the message
//! flow can be exercised end to end from the command line.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::backend::{BundlerBackend, FsOptions, HostDocument};
use crate::compile::{CompilePlan, CompiledProgram};
use crate::error::BundlerError;
use crate::protocol::DevToolsKind;
use crate::render::DocumentMarkup;
use crate::transformer::{PassThrough, Transformer};

#[derive(Default)]
pub struct HeadlessBackend {
    fs: Mutex<FsOptions>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fs_options(&self) -> FsOptions {
        *self.fs.lock()
    }
}

impl BundlerBackend for HeadlessBackend {
    fn configure_fs(&self, options: FsOptions) {
        *self.fs.lock() = options;
    }

    fn reset_modules(&self) {
        debug!("headless backend keeps no module cache");
    }

    fn load_transformer<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn Transformer>, BundlerError>> {
        async move { Ok(Arc::new(PassThrough::new(name)) as Arc<dyn Transformer>) }.boxed()
    }

    fn build(&self, plan: CompilePlan) -> BoxFuture<'_, Result<CompiledProgram, BundlerError>> {
        async move {
            let modules = plan
                .modules
                .iter()
                .map(|m| m.apply(&plan.transformers))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CompiledProgram {
                entry: plan.entry,
                modules,
                dependencies: plan.dependencies,
            })
        }
        .boxed()
    }

    fn evaluate(&self, program: &CompiledProgram) -> Result<(), BundlerError> {
        debug!(
            modules = program.modules.len(),
            "headless backend does not execute programs"
        );
        Ok(())
    }

    fn run_console_command(&self, _command: &str) -> Result<Value, BundlerError> {
        Err(BundlerError::evaluation(
            "no program runtime is attached to this sandbox",
        ))
    }
}

/// Keeps the last rendered markup. Height is never measurable.
#[derive(Default)]
pub struct HeadlessDocument {
    markup: Mutex<Option<DocumentMarkup>>,
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markup(&self) -> Option<DocumentMarkup> {
        self.markup.lock().clone()
    }
}

impl HostDocument for HeadlessDocument {
    fn replace_document(&self, markup: &DocumentMarkup) {
        *self.markup.lock() = Some(markup.clone());
    }

    fn reload(&self) {
        self.markup.lock().take();
    }

    fn measure_height(&self) -> Option<u32> {
        None
    }

    fn load_devtools(&self, kind: DevToolsKind) -> BoxFuture<'_, Result<(), BundlerError>> {
        async move {
            debug!(?kind, "devtools are not available headless");
            Ok(())
        }
        .boxed()
    }
}
