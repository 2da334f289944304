use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure, parsed from a runtime's YAML config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    pub runtime: RuntimeMetadata,
    pub boxes: Vec<BoxDef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeMetadata {
    pub name: String,
    pub version: String,
    #[serde(default = "default_request_timeout_ms")]
    pub default_request_timeout_ms: u64,
    #[serde(default)]
    pub sandbox_image: Option<String>,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// One guest program this runtime knows how to launch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BoxDef {
    pub name: String,
    /// argv of the guest binary or script; `program[0]` is the executable.
    pub program: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub auto_start: bool,
    /// Name of a compiled-in startup task to run once before the event loop.
    #[serde(default)]
    pub task: Option<String>,
    /// Names of compiled-in message handlers to install, tried in order.
    #[serde(default)]
    pub message_handlers: Vec<String>,
    /// Event name -> compiled-in handler names to install for it.
    #[serde(default)]
    pub event_handlers: HashMap<String, Vec<String>>,
}
