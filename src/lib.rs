pub mod backend;
pub mod channel;
pub mod compile;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod headless;
pub mod listeners;
pub mod logging;
pub mod module;
pub mod orchestrator;
pub mod preset;
pub mod protocol;
pub mod render;
pub mod report;
pub mod resize;
pub mod resolver;
pub mod sandbox;
pub mod transformer;

#[cfg(test)]
mod testing;
