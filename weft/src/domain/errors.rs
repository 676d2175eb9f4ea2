//! Structured error types for weft
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by the host-process instrumentation interface.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("unit {0} is not modifiable")]
    UnmodifiableUnit(String),

    #[error("verification failed for unit {unit}: {reason}")]
    VerificationFailed { unit: String, reason: String },

    #[error("failed to append search path entry {path}: {source}")]
    SearchPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures starting or running the control-plane server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind control port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
