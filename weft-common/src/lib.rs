//! # Shared Control-Plane Types (agent ↔ client tooling)
//!
//! Defines the messages and constants shared between the in-process agent
//! and the external client tooling that talks to it over TCP or produces
//! compiled probe scripts on disk.
//!
//! ## Key Types
//!
//! - [`Command`] - Control-plane messages: one `Instrument` request in,
//!   exactly one `Okay`/`Error` acknowledgement out per admission
//! - [`ProbeScript`] - The compiled probe script format (JSON, `.probe`)
//!
//! The wire framing is one JSON document per line ([`write_command`] /
//! [`read_command`]). Everything beyond the single acknowledgement (event
//! streaming, script upload negotiation) belongs to the client runtime,
//! not to this crate.

use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};

// ============================================================================
// Constants
// ============================================================================

/// Default control-plane port the agent listens on.
pub const DEFAULT_PORT: u16 = 2020;

/// File extension of compiled probe scripts.
pub const SCRIPT_EXT: &str = "probe";

/// File extension of probe-pack archives accepted on search paths.
pub const PACK_EXT: &str = "pack";

/// Output-destination sentinel meaning "write to the foreground sink".
pub const STDOUT_SENTINEL: &str = "::stdout";

/// Timestamp substitution token recognized in output path templates.
pub const TS_TOKEN: &str = "${ts}";

// ============================================================================
// Messages
// ============================================================================

/// A control-plane message.
///
/// A connecting client sends `Instrument`; the agent answers every
/// admission attempt with exactly one `Okay` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Request admission of a compiled probe script.
    Instrument { script: ProbeScript },
    /// Admission succeeded.
    Okay,
    /// Admission failed; `cause` is human-readable.
    Error { cause: String },
}

/// A compiled probe script, as produced by the external probe compiler.
///
/// The agent only interprets the unit patterns; `payload` is opaque and
/// handed through to the weaving collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeScript {
    /// Script name, used in diagnostics and transformer identity.
    pub name: String,
    /// Code-unit name patterns this script instruments.
    ///
    /// A trailing `*` matches any suffix; anything else is an exact match.
    pub unit_patterns: Vec<String>,
    /// Opaque compiled probe payload.
    #[serde(default)]
    pub payload: String,
}

impl ProbeScript {
    /// Whether any of the script's patterns accepts the given unit name.
    #[must_use]
    pub fn matches_unit(&self, unit_name: &str) -> bool {
        self.unit_patterns.iter().any(|p| pattern_matches(p, unit_name))
    }

    /// A script with no unit patterns has no active probes.
    #[must_use]
    pub fn has_probes(&self) -> bool {
        !self.unit_patterns.is_empty()
    }
}

fn pattern_matches(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}

// ============================================================================
// Wire framing
// ============================================================================

/// Write one command as a single JSON line and flush.
///
/// # Errors
/// Returns any underlying I/O error; serialization of these types cannot
/// fail for non-string-key reasons, but a failure is surfaced as
/// `InvalidData` rather than panicking.
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, command).map_err(io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Read one JSON-line command.
///
/// # Errors
/// `UnexpectedEof` when the peer closed the channel, `InvalidData` when
/// the line is not a valid command, or any underlying I/O error.
pub fn read_command<R: BufRead>(reader: &mut R) -> io::Result<Command> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "control channel closed"));
    }
    serde_json::from_str(line.trim_end()).map_err(io::Error::from)
}
