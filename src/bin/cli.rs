// CLI binary: bad arguments end the process with a message.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use sandbox_bundler::channel::JsonLinesChannel;
use sandbox_bundler::config::{self, SandboxConfig};
use sandbox_bundler::headless::{HeadlessBackend, HeadlessDocument};
use sandbox_bundler::logging::{self, LogLevel};
use sandbox_bundler::module::{DepMap, Module};
use sandbox_bundler::preset::{ActivePreset, Preset, PresetRegistry};
use sandbox_bundler::protocol::InboundMessage;
use sandbox_bundler::sandbox::{Sandbox, SandboxParts};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sandbox-cli", about = "Sandbox bundler headless CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the transformer chain each path would get
    Resolve {
        #[arg(long, default_value = "react")]
        template: String,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the dependency manifest after the preset's additions
    Deps {
        #[arg(long, default_value = "react")]
        template: String,
        /// NAME=RANGE, repeatable
        #[arg(long = "dep", value_parser = parse_dep)]
        deps: Vec<(String, String)>,
    },
    /// Speak the host protocol as JSON lines on stdin/stdout
    Serve {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        debounce_ms: Option<u64>,
        #[arg(long)]
        default_preset: Option<String>,
        #[arg(long)]
        log_level: Option<LogLevel>,
    },
}

fn parse_dep(raw: &str) -> Result<(String, String), String> {
    let (name, range) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=RANGE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("missing package name in '{raw}'"));
    }
    Ok((name.to_string(), range.to_string()))
}

// ── Commands ─────────────────────────────────────────────────────

async fn active_preset(template: &str) -> ActivePreset {
    let preset = PresetRegistry::builtin().get(template);
    match preset.init(&HeadlessBackend::new()).await {
        Ok(active) => active,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run_resolve(template: &str, paths: &[String], raw: bool) -> bool {
    let active = active_preset(template).await;
    let mut all_ok = true;
    let mut report = serde_json::Map::new();

    for path in paths {
        let module = Module::new(path.clone(), "");
        let entry = match active.chain_for(&module) {
            Ok(chain) => {
                if !raw {
                    let names: Vec<_> = chain.iter().map(|b| b.name.as_str()).collect();
                    println!("{path}: {}", names.join(" -> "));
                }
                json!({ "chain": chain })
            }
            Err(e) => {
                all_ok = false;
                if !raw {
                    println!("{path}: error: {e}");
                }
                json!({ "error": e })
            }
        };
        report.insert(path.clone(), entry);
    }

    if raw {
        println!("{}", Value::Object(report));
    }
    all_ok
}

fn run_deps(template: &str, deps: Vec<(String, String)>, raw: bool) {
    let preset: Preset = PresetRegistry::builtin().get(template);
    let augmented = preset.augment_dependencies(deps.into_iter().collect::<DepMap>());
    if raw {
        println!("{}", serde_json::to_string(&augmented).unwrap());
    } else {
        for (name, range) in &augmented {
            println!("{name}@{range}");
        }
    }
}

async fn run_serve(
    config_path: Option<PathBuf>,
    debounce_ms: Option<u64>,
    default_preset: Option<String>,
    log_level: Option<LogLevel>,
) {
    let mut config = match config_path {
        Some(path) => config::load_config(&path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
        None => SandboxConfig::default(),
    };
    if let Some(ms) = debounce_ms {
        config.debounce_ms = ms;
    }
    if let Some(name) = default_preset {
        let Some(preset) = Preset::all().iter().copied().find(|p| p.name() == name) else {
            eprintln!("Error: unknown preset '{name}'");
            process::exit(1);
        };
        config.default_preset = preset;
    }
    if let Some(level) = log_level {
        config.log_level = level;
    }

    let log = logging::init(config.log_level);
    let parts = SandboxParts {
        backend: Arc::new(HeadlessBackend::new()),
        document: Arc::new(HeadlessDocument::new()),
        channel: Arc::new(JsonLinesChannel::new(std::io::stdout())),
        log,
    };
    let mut sandbox = Sandbox::start(parts, &config, None);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match serde_json::from_str::<InboundMessage>(&line) {
                Ok(message) => sandbox.handle_message(message).await,
                Err(e) => warn!("ignoring malformed message: {e}"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {e}");
                break;
            }
        }
    }

    info!("input closed, shutting down");
    sandbox.shutdown().await;
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let raw = cli.json;

    match cli.command {
        Commands::Resolve { template, paths } => {
            if !run_resolve(&template, &paths, raw).await {
                process::exit(1);
            }
        }
        Commands::Deps { template, deps } => run_deps(&template, deps, raw),
        Commands::Serve {
            config,
            debounce_ms,
            default_preset,
            log_level,
        } => run_serve(config, debounce_ms, default_preset, log_level).await,
    }
}
