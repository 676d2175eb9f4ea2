//! Loading of on-disk compiled probe scripts.
//!
//! Startup-time admission source: every configured script path, and every
//! entry of the configured script directory, becomes one [`FileClient`]
//! submitted to the coordinator. Submissions are waited on one by one, so
//! local scripts are admitted strictly in order and serialized with remote
//! clients. Entries that are missing, not files, or not compiled probe
//! scripts are skipped with a diagnostic and never stop the iteration.

use crate::admission::Coordinator;
use crate::client::{FileClient, OutputDest};
use crate::config::Settings;
use crate::host::Host;
use anyhow::{bail, Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use weft_common::{ProbeScript, SCRIPT_EXT, STDOUT_SENTINEL, TS_TOKEN};

/// Load and admit all configured scripts, in order.
pub fn run(settings: &Settings, host: &Arc<dyn Host>, coordinator: &Coordinator) {
    let mut entries: Vec<PathBuf> = settings.scripts.clone();

    if let Some(dir) = &settings.script_dir {
        match fs::read_dir(dir) {
            Ok(listing) => entries.extend(listing.flatten().map(|e| e.path())),
            Err(e) => warn!("cannot scan script directory {}: {e}", dir.display()),
        }
    }

    for path in entries {
        if let Err(e) = load_one(settings, host, coordinator, &path) {
            debug!("skipping script {}: {e:#}", path.display());
        }
    }
}

fn load_one(
    settings: &Settings,
    host: &Arc<dyn Host>,
    coordinator: &Coordinator,
    path: &Path,
) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXT) {
        bail!("not a compiled .{SCRIPT_EXT} script");
    }
    if !path.is_file() {
        bail!("does not exist or is not a regular file");
    }

    let script = read_script(path)?;
    let output = resolve_output(settings, path, now_millis());
    let client = FileClient::new(Arc::clone(host), path, script, output, settings.debug)
        .with_context(|| "opening script output".to_string())?;

    coordinator.submit(Arc::new(client)).wait();
    Ok(())
}

/// Parse a compiled probe script.
///
/// # Errors
/// Unreadable file or a payload that is not a compiled probe script.
pub fn read_script(path: &Path) -> Result<ProbeScript> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a compiled probe script", path.display()))
}

/// Resolve where a script client's output goes.
///
/// Foreground sink when requested (flag or `::stdout` sentinel); otherwise
/// the explicit override template, or a name derived from the script path
/// plus the agent qualifier. `${ts}` is expanded against `ts_millis` in
/// either case.
#[must_use]
pub fn resolve_output(settings: &Settings, script_path: &Path, ts_millis: u128) -> OutputDest {
    if settings.stdout {
        return OutputDest::Stdout;
    }
    match settings.script_output_file.as_deref() {
        Some(STDOUT_SENTINEL) => OutputDest::Stdout,
        Some(template) => OutputDest::File(PathBuf::from(expand_ts(template, ts_millis))),
        None => {
            let derived =
                format!("{}.{}.{TS_TOKEN}.trace", script_path.display(), settings.agent_name);
            debug!("scriptOutputFile not specified, defaulting to {derived}");
            OutputDest::File(PathBuf::from(expand_ts(&derived, ts_millis)))
        }
    }
}

/// Replace every `${ts}` token with the given timestamp.
#[must_use]
pub fn expand_ts(template: &str, ts_millis: u128) -> String {
    template.replace(TS_TOKEN, &ts_millis.to_string())
}

fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}
