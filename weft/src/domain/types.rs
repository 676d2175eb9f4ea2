//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like confusing a code-unit
//! identity with an ordinary integer, and make function signatures more
//! expressive.

use std::fmt;

/// Code-unit ID
///
/// Stable identity the host process assigns to one loaded, independently
/// transformable unit. Distinct from the unit's name, which may be reused
/// across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// One loaded code unit in the target process.
///
/// The granularity at which instrumentation is applied. Only the host
/// process can say whether a unit is currently modifiable; a `CodeUnit`
/// value is just its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    pub id: UnitId,
    /// Fully qualified unit name, `::`-separated.
    pub name: String,
}

impl CodeUnit {
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id: UnitId(id), name: name.into() }
    }
}

impl fmt::Display for CodeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
