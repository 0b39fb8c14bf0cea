//! One compile cycle, from a debounced request to `status=idle`.
//!
//! ```text
//! Idle → Initializing → Compiling → Rendering → Evaluating → Idle
//! ```
//!
//! Any failure jumps to `Idle`. Cycle-scoped data travels inside [`Cycle`];
//! the orchestrator itself only keeps what outlives a cycle (the first-load
//! flag and the initialized preset).

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::backend::{BundlerBackend, FsOptions, HostDocument};
use crate::channel::HostChannel;
use crate::compile::{self, CompiledProgram};
use crate::error::BundlerError;
use crate::logging::LogControl;
use crate::preset::{ActivePreset, PresetRegistry};
use crate::protocol::{CompileRequest, CompileStatus, OutboundMessage};
use crate::render::DocumentMarkup;
use crate::report::ErrorRecord;
use crate::resize::ResizeMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Compiling,
    Rendering,
    Evaluating,
    Idle,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::Compiling => "compiling",
            Phase::Rendering => "rendering",
            Phase::Evaluating => "evaluating",
            Phase::Idle => "idle",
        }
    }
}

/// A cycle between two transitions, carrying what the next phase needs.
enum Cycle {
    Initializing(CompileRequest),
    Compiling {
        request: CompileRequest,
        preset: ActivePreset,
    },
    Rendering {
        markup: DocumentMarkup,
        program: Option<CompiledProgram>,
    },
    Evaluating(CompiledProgram),
    Idle,
}

impl Cycle {
    fn phase(&self) -> Phase {
        match self {
            Cycle::Initializing(_) => Phase::Initializing,
            Cycle::Compiling { .. } => Phase::Compiling,
            Cycle::Rendering { .. } => Phase::Rendering,
            Cycle::Evaluating(_) => Phase::Evaluating,
            Cycle::Idle => Phase::Idle,
        }
    }
}

pub struct CompileOrchestrator {
    registry: Arc<PresetRegistry>,
    backend: Arc<dyn BundlerBackend>,
    document: Arc<dyn HostDocument>,
    channel: Arc<dyn HostChannel>,
    resize: Arc<ResizeMonitor>,
    log: LogControl,
    first_load: bool,
    active: Option<ActivePreset>,
}

impl CompileOrchestrator {
    pub fn new(
        registry: Arc<PresetRegistry>,
        backend: Arc<dyn BundlerBackend>,
        document: Arc<dyn HostDocument>,
        channel: Arc<dyn HostChannel>,
    ) -> Self {
        let resize = Arc::new(ResizeMonitor::new(document.clone(), channel.clone()));
        Self {
            registry,
            backend,
            document,
            channel,
            resize,
            log: LogControl::disabled(),
            first_load: true,
            active: None,
        }
    }

    /// Share a resize monitor with a poller so both report against the same
    /// last height.
    pub fn with_resize_monitor(mut self, resize: Arc<ResizeMonitor>) -> Self {
        self.resize = resize;
        self
    }

    pub fn with_log_control(mut self, log: LogControl) -> Self {
        self.log = log;
        self
    }

    pub fn is_first_load(&self) -> bool {
        self.first_load
    }

    pub fn active_preset(&self) -> Option<&ActivePreset> {
        self.active.as_ref()
    }

    /// Run one cycle to completion. Failures are reported to the host, never
    /// returned; every cycle ends with exactly one `status=idle`.
    pub async fn run_cycle(&mut self, request: CompileRequest) {
        let mut cycle = self.begin(request);
        loop {
            debug!(phase = cycle.phase().name(), "compile phase");
            cycle = match cycle {
                Cycle::Initializing(request) => self.initialize(request).await,
                Cycle::Compiling { request, preset } => self.compile(request, preset).await,
                Cycle::Rendering { markup, program } => self.render(&markup, program),
                Cycle::Evaluating(program) => self.evaluate(&program),
                Cycle::Idle => break,
            };
        }
        self.send_status(CompileStatus::Idle);
    }

    // ── Transitions ─────────────────────────────────────────────────

    fn begin(&mut self, request: CompileRequest) -> Cycle {
        if let Some(level) = request.log_level {
            self.log.apply(level);
        }
        self.backend.configure_fs(FsOptions {
            has_async_file_resolver: request.has_file_resolver,
        });
        self.channel.send(OutboundMessage::Start {
            first_load: self.first_load,
        });
        self.send_status(CompileStatus::Initializing);
        if self.first_load {
            debug!("first load, resetting modules");
            self.backend.reset_modules();
        }
        Cycle::Initializing(request)
    }

    async fn initialize(&mut self, request: CompileRequest) -> Cycle {
        if let Some(kind) = request.react_dev_tools {
            if let Err(e) = self.document.load_devtools(kind).await {
                warn!(?kind, "devtools integration failed to load: {e}");
            }
        }
        match self.activate(request.template.as_deref()).await {
            Ok(preset) => Cycle::Compiling { request, preset },
            Err(e) => {
                self.report(&e);
                Cycle::Idle
            }
        }
    }

    async fn compile(&mut self, request: CompileRequest, preset: ActivePreset) -> Cycle {
        let modules = request.modules();
        let markup = DocumentMarkup::select(&modules, preset.preset());
        let result = AssertUnwindSafe(compile::compile(&preset, modules, self.backend.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(BundlerError::build(panic_message(&*payload))));
        self.first_load = false;

        match result {
            Ok(program) => {
                self.channel.send(OutboundMessage::Done {
                    compilation_error: false,
                });
                Cycle::Rendering {
                    markup,
                    program: Some(program),
                }
            }
            Err(e) => {
                self.report(&e);
                self.channel.send(OutboundMessage::Done {
                    compilation_error: true,
                });
                Cycle::Rendering {
                    markup,
                    program: None,
                }
            }
        }
    }

    fn render(&self, markup: &DocumentMarkup, program: Option<CompiledProgram>) -> Cycle {
        self.document.replace_document(markup);
        program.map_or(Cycle::Idle, Cycle::Evaluating)
    }

    fn evaluate(&self, program: &CompiledProgram) -> Cycle {
        self.send_status(CompileStatus::Evaluating);
        let backend = self.backend.as_ref();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| backend.evaluate(program)))
            .unwrap_or_else(|payload| Err(BundlerError::evaluation(panic_message(&*payload))));

        match outcome {
            Ok(()) => {
                self.resize.check();
                self.channel.send(OutboundMessage::Success);
                info!("evaluation finished");
            }
            Err(e) => self.report(&e),
        }
        Cycle::Idle
    }

    // ── Helpers ─────────────────────────────────────────────────────

    /// The preset for `template`, initializing it unless it is the one
    /// already active.
    async fn activate(&mut self, template: Option<&str>) -> Result<ActivePreset, BundlerError> {
        let preset = match template {
            Some(name) => self.registry.get(name),
            None => self.registry.default_preset(),
        };
        if let Some(active) = self.active.as_ref().filter(|a| a.preset() == preset) {
            debug!(%preset, "reusing initialized preset");
            return Ok(active.clone());
        }
        let active = AssertUnwindSafe(preset.init(self.backend.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(BundlerError::PresetInit {
                    preset: preset.name().to_string(),
                    message: panic_message(&*payload),
                })
            })?;
        self.active = Some(active.clone());
        Ok(active)
    }

    fn report(&self, error: &BundlerError) {
        let record = ErrorRecord::classify(error);
        error!(kind = record.title(), "{error}");
        self.channel.send(OutboundMessage::Action(record.to_action()));
    }

    fn send_status(&self, status: CompileStatus) {
        self.channel.send(OutboundMessage::Status { status });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "backend panicked".to_string())
}
