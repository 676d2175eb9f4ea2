//! Immutable agent settings built once from the injected argument map.
//!
//! Argument parsing itself is owned by the embedder; this module only
//! converts the flat option map into a typed, immutable [`Settings`] value
//! that is passed by reference into every component. Malformed values log
//! a warning and fall back to their defaults, never aborting the agent.

use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;
use weft_common::DEFAULT_PORT;

/// Typed view of the agent's option map, frozen at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Control-plane port (`port`, default 2020).
    pub port: u16,
    /// Compiled probe scripts to load at startup (`script`, comma-separated).
    pub scripts: Vec<PathBuf>,
    /// Directory scanned for compiled probe scripts (`scriptdir`).
    pub script_dir: Option<PathBuf>,
    /// Output path template for script clients (`scriptOutputFile`).
    ///
    /// Supports the `${ts}` substitution token and the `::stdout` sentinel.
    pub script_output_file: Option<String>,
    /// Skip starting the control-plane server entirely (`noServer`).
    pub no_server: bool,
    /// Verbose diagnostics; also selects per-unit retransformation (`debug`).
    pub debug: bool,
    /// Route script output to the foreground sink (`stdout`).
    pub stdout: bool,
    /// Agent qualifier used in derived output names (`agent`).
    pub agent_name: String,
    /// Probe-pack entries appended to the host's boot search path
    /// (`bootSearchPath`, platform path-separator separated).
    pub boot_search_path: Vec<PathBuf>,
    /// Probe-pack entries appended to the host's system search path
    /// (`systemSearchPath`).
    pub system_search_path: Vec<PathBuf>,
}

impl Settings {
    /// Build settings from the already-parsed option map.
    #[must_use]
    pub fn from_args(args: &HashMap<String, String>) -> Self {
        let port = match args.get("port") {
            Some(p) => p.parse().unwrap_or_else(|_| {
                warn!("invalid port {p:?}, assuming default {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let scripts = args
            .get("script")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        Settings {
            port,
            scripts,
            script_dir: args.get("scriptdir").map(PathBuf::from),
            script_output_file: args.get("scriptOutputFile").filter(|s| !s.is_empty()).cloned(),
            no_server: flag(args, "noServer"),
            debug: flag(args, "debug"),
            stdout: flag(args, "stdout"),
            agent_name: args.get("agent").cloned().unwrap_or_else(|| "default".to_string()),
            boot_search_path: search_path(args, "bootSearchPath"),
            system_search_path: search_path(args, "systemSearchPath"),
        }
    }
}

/// Boolean option convention: present and not `"false"` means true, so a
/// bare `noServer` (empty value) switches the feature on.
fn flag(args: &HashMap<String, String>, key: &str) -> bool {
    matches!(args.get(key), Some(v) if v != "false")
}

fn search_path(args: &HashMap<String, String>, key: &str) -> Vec<PathBuf> {
    args.get(key).map(|v| std::env::split_paths(v).collect()).unwrap_or_default()
}
