//! Contracts the core expects from its collaborators: the bundler backend
//! that owns the module graph and runs code, and the host document the
//! program renders into.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::compile::{CompilePlan, CompiledProgram};
use crate::error::BundlerError;
use crate::protocol::DevToolsKind;
use crate::render::DocumentMarkup;
use crate::transformer::Transformer;

/// How the backend reaches files the request did not include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsOptions {
    /// The host answers file reads asynchronously over the channel.
    pub has_async_file_resolver: bool,
}

pub trait BundlerBackend: Send + Sync {
    fn configure_fs(&self, options: FsOptions);

    /// Drop every cached module. Called on the first cycle after a load.
    fn reset_modules(&self);

    fn load_transformer<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn Transformer>, BundlerError>>;

    /// Install dependencies, build the module graph and produce a program.
    fn build(&self, plan: CompilePlan) -> BoxFuture<'_, Result<CompiledProgram, BundlerError>>;

    /// Run the program. Errors thrown by the program come back as `Err`.
    fn evaluate(&self, program: &CompiledProgram) -> Result<(), BundlerError>;

    /// Evaluate a console-style command in the program's scope.
    fn run_console_command(&self, command: &str) -> Result<Value, BundlerError>;
}

pub trait HostDocument: Send + Sync {
    fn replace_document(&self, markup: &DocumentMarkup);

    /// Reload the whole document, abandoning whatever the program was doing.
    fn reload(&self);

    /// Current rendered height in pixels, if it can be measured.
    fn measure_height(&self) -> Option<u32>;

    fn load_devtools(&self, kind: DevToolsKind) -> BoxFuture<'_, Result<(), BundlerError>>;
}
