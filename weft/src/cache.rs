//! Lazily populated metadata cache for observed code units.
//!
//! Every unit visited during candidate selection lands here, selected or
//! not, so later admissions and the weaving collaborator can look derived
//! metadata up without re-deriving it. Shared across admission tasks;
//! uncontended in practice because admissions are serialized.

use crate::domain::{CodeUnit, UnitId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Metadata derived once per observed unit.
#[derive(Debug, PartialEq, Eq)]
pub struct UnitMeta {
    /// Enclosing namespace, if the unit name is `::`-qualified.
    pub namespace: Option<String>,
    /// Final path segment of the unit name.
    pub simple_name: String,
}

impl UnitMeta {
    fn derive(unit: &CodeUnit) -> Self {
        match unit.name.rsplit_once("::") {
            Some((ns, simple)) => UnitMeta {
                namespace: Some(ns.to_string()),
                simple_name: simple.to_string(),
            },
            None => UnitMeta { namespace: None, simple_name: unit.name.clone() },
        }
    }
}

/// Process-wide memoized unit-identity → metadata mapping.
#[derive(Default)]
pub struct UnitCache {
    inner: Mutex<HashMap<UnitId, Arc<UnitMeta>>>,
}

impl UnitCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a unit's metadata up, deriving and memoizing it on first sight.
    pub fn get(&self, unit: &CodeUnit) -> Arc<UnitMeta> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(inner.entry(unit.id).or_insert_with(|| Arc::new(UnitMeta::derive(unit))))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
