//! Single source of truth for envelope `type` names shared with the host.

// Outbound
pub const INITIALIZED: &str = "initialized";
pub const START: &str = "start";
pub const STATUS: &str = "status";
pub const DONE: &str = "done";
pub const ACTION: &str = "action";
pub const SUCCESS: &str = "success";
pub const CONSOLE: &str = "console";
pub const RESIZE: &str = "resize";
pub const REFRESH: &str = "refresh";

// Inbound
pub const COMPILE: &str = "compile";
pub const EVALUATE: &str = "evaluate";
