//! Host-process instrumentation interface.
//!
//! The agent never mutates loaded code directly; everything goes through
//! this narrow surface provided by the hosting runtime. Retransformation
//! is not safe under concurrent invocation, which is why all callers are
//! funnelled through the serialized admission coordinator.

use crate::domain::{CodeUnit, HostError};
use std::path::Path;
use std::sync::Arc;

/// Which of the host's probe-pack search paths to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPathKind {
    Boot,
    System,
}

/// Operations the hosting runtime exposes to the agent.
pub trait Host: Send + Sync {
    /// Snapshot of the units currently loaded in the target process.
    fn loaded_units(&self) -> Vec<CodeUnit>;

    /// Whether the host can currently replace this unit's in-memory form.
    fn is_modifiable(&self, unit: &CodeUnit) -> bool;

    /// Re-apply instrumentation to the given units.
    ///
    /// Callers decide the granularity: one-element slices for per-unit
    /// requests, the full candidate set for a batch.
    ///
    /// # Errors
    /// [`HostError::UnmodifiableUnit`] or [`HostError::VerificationFailed`],
    /// attributed to the first offending unit.
    fn retransform(&self, units: &[CodeUnit]) -> Result<(), HostError>;

    /// Install a listener for units loaded in the future.
    fn add_transformer(&self, transformer: Arc<dyn Transformer>);

    /// Append one probe-pack location to a search path.
    ///
    /// # Errors
    /// [`HostError::SearchPath`] when the host cannot open the entry.
    fn append_search_path(&self, kind: SearchPathKind, path: &Path) -> Result<(), HostError>;
}

/// Registration surface of a client's transformation logic.
///
/// The weaving callback itself lives in the instrumentation collaborator;
/// the admission core only needs identity and the unit filter.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this transformer wants to instrument the given unit.
    fn wants(&self, unit: &CodeUnit) -> bool;
}
