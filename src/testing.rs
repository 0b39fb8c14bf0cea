//! Test doubles for the backend and host contracts.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::subscriber::DefaultGuard;

use crate::backend::{BundlerBackend, FsOptions, HostDocument};
use crate::compile::{CompilePlan, CompiledProgram};
use crate::error::BundlerError;
use crate::module::Module;
use crate::protocol::DevToolsKind;
use crate::render::DocumentMarkup;
use crate::transformer::{PassThrough, Transformer, TransformerOptions};

// ── Log capture ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn warn_subscriber(buf: &SharedBuf) -> impl tracing::Subscriber + Send + Sync {
    let writer = buf.clone();
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .with_writer(move || writer.clone())
        .finish()
}

/// Run `f` and return its result with every warning it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buf = SharedBuf::default();
    let result = tracing::subscriber::with_default(warn_subscriber(&buf), f);
    (result, buf.contents())
}

/// Capture warnings on this thread until the guard drops. Works across
/// awaits on a current-thread runtime.
pub fn capture_warnings() -> (DefaultGuard, SharedBuf) {
    let buf = SharedBuf::default();
    let guard = tracing::subscriber::set_default(warn_subscriber(&buf));
    (guard, buf)
}

// ── Transformers ────────────────────────────────────────────────────

/// Appends `|name` to the source so tests can read back chain order.
pub struct AppendingTransformer {
    name: String,
}

impl AppendingTransformer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Transformer for AppendingTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(
        &self,
        mut module: Module,
        _options: &TransformerOptions,
    ) -> Result<Module, BundlerError> {
        module.source = format!("{}|{}", module.source, self.name);
        Ok(module)
    }
}

// ── Backend ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeBackend {
    failing_transformer: Option<String>,
    load_delay: Option<Duration>,
    build_delay: Option<Duration>,
    build_error: Option<BundlerError>,
    eval_error: Option<BundlerError>,
    eval_panics: bool,
    build_panics: bool,
    load_panics: bool,
    pub loads: AtomicUsize,
    pub builds: AtomicUsize,
    pub evaluations: AtomicUsize,
    pub resets: AtomicUsize,
    pub fs_options: Mutex<Vec<FsOptions>>,
    pub plans: Mutex<Vec<CompilePlan>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_transformer(mut self, name: &str) -> Self {
        self.failing_transformer = Some(name.to_string());
        self
    }

    pub fn load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    pub fn build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    pub fn failing_build(mut self, error: BundlerError) -> Self {
        self.build_error = Some(error);
        self
    }

    pub fn failing_evaluation(mut self, error: BundlerError) -> Self {
        self.eval_error = Some(error);
        self
    }

    pub fn panicking_evaluation(mut self) -> Self {
        self.eval_panics = true;
        self
    }

    pub fn panicking_build(mut self) -> Self {
        self.build_panics = true;
        self
    }

    pub fn panicking_load(mut self) -> Self {
        self.load_panics = true;
        self
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    /// Entry paths of every plan built so far, in order.
    pub fn built_paths(&self) -> Vec<Vec<String>> {
        self.plans
            .lock()
            .iter()
            .map(|p| p.modules.iter().map(|m| m.module.filepath.clone()).collect())
            .collect()
    }
}

impl BundlerBackend for FakeBackend {
    fn configure_fs(&self, options: FsOptions) {
        self.fs_options.lock().push(options);
    }

    fn reset_modules(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn load_transformer<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn Transformer>, BundlerError>> {
        async move {
            if let Some(delay) = self.load_delay {
                tokio::time::sleep(delay).await;
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.load_panics {
                panic!("loader crashed on {name}");
            }
            if self.failing_transformer.as_deref() == Some(name) {
                return Err(BundlerError::build(format!("cannot fetch {name}")));
            }
            Ok(Arc::new(PassThrough::new(name)) as Arc<dyn Transformer>)
        }
        .boxed()
    }

    fn build(&self, plan: CompilePlan) -> BoxFuture<'_, Result<CompiledProgram, BundlerError>> {
        async move {
            if let Some(delay) = self.build_delay {
                tokio::time::sleep(delay).await;
            }
            self.builds.fetch_add(1, Ordering::SeqCst);
            self.plans.lock().push(plan.clone());
            if self.build_panics {
                panic!("bundler crashed");
            }
            if let Some(error) = &self.build_error {
                return Err(error.clone());
            }
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

    fn evaluate(&self, _program: &CompiledProgram) -> Result<(), BundlerError> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        if self.eval_panics {
            panic!("program crashed the evaluator");
        }
        match &self.eval_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn run_console_command(&self, command: &str) -> Result<Value, BundlerError> {
        if command.contains("throw") {
            return Err(BundlerError::evaluation(format!("Uncaught {command}")));
        }
        Ok(Value::String(format!("evaluated {command}")))
    }
}

// ── Host document ───────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDocument {
    fail_devtools: bool,
    panic_on_render: AtomicBool,
    pub height: Mutex<Option<u32>>,
    pub documents: Mutex<Vec<DocumentMarkup>>,
    pub reloads: AtomicUsize,
    pub devtools: Mutex<Vec<DevToolsKind>>,
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_devtools(mut self) -> Self {
        self.fail_devtools = true;
        self
    }

    /// The next `replace_document` panics; later ones succeed.
    pub fn panicking_render_once(self) -> Self {
        self.panic_on_render.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_height(self, height: u32) -> Self {
        *self.height.lock() = Some(height);
        self
    }

    pub fn set_height(&self, height: u32) {
        *self.height.lock() = Some(height);
    }
}

impl HostDocument for FakeDocument {
    fn replace_document(&self, markup: &DocumentMarkup) {
        if self.panic_on_render.swap(false, Ordering::SeqCst) {
            panic!("document replacement crashed");
        }
        self.documents.lock().push(markup.clone());
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn measure_height(&self) -> Option<u32> {
        *self.height.lock()
    }

    fn load_devtools(&self, kind: DevToolsKind) -> BoxFuture<'_, Result<(), BundlerError>> {
        async move {
            self.devtools.lock().push(kind);
            if self.fail_devtools {
                return Err(BundlerError::IntegrationLoad {
                    message: "devtools bundle unavailable".into(),
                });
            }
            Ok(())
        }
        .boxed()
    }
}
