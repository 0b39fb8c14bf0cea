//! The running sandbox: host messages in, one compile worker, plus the resize
//! poller and runtime-event listener.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{BundlerBackend, HostDocument};
use crate::channel::HostChannel;
use crate::config::SandboxConfig;
use crate::debounce::DebounceScheduler;
use crate::listeners::{self, RuntimeEventReceiver};
use crate::logging::LogControl;
use crate::orchestrator::CompileOrchestrator;
use crate::preset::PresetRegistry;
use crate::protocol::{CompileRequest, ConsoleLog, InboundMessage, OutboundMessage};
use crate::resize::ResizeMonitor;

/// Collaborators a sandbox is built from.
#[derive(Clone)]
pub struct SandboxParts {
    pub backend: Arc<dyn BundlerBackend>,
    pub document: Arc<dyn HostDocument>,
    pub channel: Arc<dyn HostChannel>,
    pub log: LogControl,
}

pub struct Sandbox {
    parts: SandboxParts,
    registry: Arc<PresetRegistry>,
    scheduler: Arc<DebounceScheduler<CompileRequest>>,
    resize: Arc<ResizeMonitor>,
    shutdown: Arc<Notify>,
    worker: JoinHandle<()>,
    poller: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl Sandbox {
    /// Announce readiness and start the background tasks. Must be called
    /// inside a tokio runtime.
    pub fn start(
        parts: SandboxParts,
        config: &SandboxConfig,
        runtime_events: Option<RuntimeEventReceiver>,
    ) -> Self {
        let registry = Arc::new(config.registry());
        let scheduler = Arc::new(DebounceScheduler::new(config.debounce_window()));
        let resize = Arc::new(ResizeMonitor::new(
            parts.document.clone(),
            parts.channel.clone(),
        ));
        let shutdown = Arc::new(Notify::new());

        parts.channel.send(OutboundMessage::Initialized);

        let poller = config
            .resize_interval()
            .map(|every| resize.clone().spawn_polling(every));
        let listener =
            runtime_events.map(|events| listeners::spawn_listener(events, parts.channel.clone()));
        let worker = spawn_worker(
            orchestrator(&parts, &registry, &resize),
            scheduler.clone(),
            shutdown.clone(),
        );

        info!(
            debounce_ms = config.debounce_ms,
            default_preset = %config.default_preset,
            "sandbox started"
        );
        Self {
            parts,
            registry,
            scheduler,
            resize,
            shutdown,
            worker,
            poller,
            listener,
        }
    }

    pub async fn handle_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Compile(request) => {
                self.scheduler.schedule(request);
            }
            InboundMessage::Refresh => self.refresh().await,
            InboundMessage::Evaluate { command } => self.evaluate(&command),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Reload the host document and start over. The in-flight cycle, if any,
    /// is abandoned mid-way and the next cycle is a first load.
    async fn refresh(&mut self) {
        self.parts.document.reload();
        if self.scheduler.cancel_pending() {
            debug!("dropped pending compile on refresh");
        }
        self.worker.abort();
        if let Err(e) = (&mut self.worker).await {
            if e.is_panic() {
                warn!("compile worker had panicked: {e}");
            } else {
                debug!("compile worker cancelled");
            }
        }
        self.worker = spawn_worker(
            orchestrator(&self.parts, &self.registry, &self.resize),
            self.scheduler.clone(),
            self.shutdown.clone(),
        );
        info!("sandbox refreshed");
        self.parts.channel.send(OutboundMessage::Refresh);
    }

    fn evaluate(&self, command: &str) {
        let entry = match self.parts.backend.run_console_command(command) {
            Ok(value) => ConsoleLog::new("result", vec![value]),
            Err(e) => ConsoleLog::new("error", vec![Value::String(e.to_string())]),
        };
        self.parts
            .channel
            .send(OutboundMessage::Console { log: vec![entry] });
    }

    /// Stop accepting work. A request still waiting out its debounce window
    /// is compiled before this returns.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.worker.await {
            debug!("compile worker ended abnormally: {e}");
        }
        if let Some(poller) = self.poller {
            poller.abort();
        }
        if let Some(listener) = self.listener {
            listener.abort();
        }
        info!("sandbox stopped");
    }
}

fn orchestrator(
    parts: &SandboxParts,
    registry: &Arc<PresetRegistry>,
    resize: &Arc<ResizeMonitor>,
) -> CompileOrchestrator {
    CompileOrchestrator::new(
        registry.clone(),
        parts.backend.clone(),
        parts.document.clone(),
        parts.channel.clone(),
    )
    .with_resize_monitor(resize.clone())
    .with_log_control(parts.log.clone())
}

fn spawn_worker(
    mut orchestrator: CompileOrchestrator,
    scheduler: Arc<DebounceScheduler<CompileRequest>>,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                request = scheduler.next_ready() => orchestrator.run_cycle(request).await,
                () = shutdown.notified() => {
                    if let Some(request) = scheduler.flush() {
                        orchestrator.run_cycle(request).await;
                    }
                    break;
                }
            }
        }
    })
}
