//! Candidate selection and retransformation driving.
//!
//! Both run inside one admission task on the coordinator's worker, which
//! is what makes the unsynchronized host queries and the shared unit
//! cache safe.

use crate::cache::UnitCache;
use crate::client::Client;
use crate::domain::{CodeUnit, HostError};
use crate::host::Host;

/// Filter the host's loaded units down to this client's candidate set.
///
/// Every visited unit populates the cache whether or not it is selected;
/// a unit is kept iff the host reports it modifiable and the client's
/// predicate accepts it. The result carries no ordering guarantee.
pub fn select_candidates(host: &dyn Host, cache: &UnitCache, client: &dyn Client) -> Vec<CodeUnit> {
    let mut candidates = Vec::new();
    for unit in host.loaded_units() {
        cache.get(&unit);
        if host.is_modifiable(&unit) && client.is_candidate(&unit) {
            client.debug_print(&format!("candidate {unit} added"));
            candidates.push(unit);
        }
    }
    candidates
}

/// Failure granularity for a retransformation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformPolicy {
    /// One host call for the whole set; any failure fails the admission.
    Batch,
    /// One host call per unit; verification failures are skipped per unit.
    /// Slower, but attributes failures to individual units.
    PerUnit,
}

impl TransformPolicy {
    /// Debug mode trades batch speed for per-unit diagnosability. This is
    /// the single place that coupling lives.
    #[must_use]
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            TransformPolicy::PerUnit
        } else {
            TransformPolicy::Batch
        }
    }
}

/// Issues retransformation requests for one candidate set.
pub struct TransformDriver {
    policy: TransformPolicy,
}

impl TransformDriver {
    #[must_use]
    pub fn new(policy: TransformPolicy) -> Self {
        Self { policy }
    }

    /// Request re-instrumentation of `units`, bracketed by the client's
    /// bookkeeping hooks. `skip_retransforms` runs before returning
    /// regardless of the outcome.
    ///
    /// # Errors
    /// The host failure that aborted the batch. Under [`TransformPolicy::PerUnit`],
    /// verification failures are not errors; anything else still is.
    pub fn retransform(
        &self,
        host: &dyn Host,
        client: &dyn Client,
        units: &[CodeUnit],
    ) -> Result<(), HostError> {
        client.start_retransform(units.len());
        let result = match self.policy {
            TransformPolicy::Batch => host.retransform(units),
            TransformPolicy::PerUnit => retransform_each(host, client, units),
        };
        client.skip_retransforms();
        result
    }
}

fn retransform_each(
    host: &dyn Host,
    client: &dyn Client,
    units: &[CodeUnit],
) -> Result<(), HostError> {
    for unit in units {
        match host.retransform(std::slice::from_ref(unit)) {
            Ok(()) => {}
            Err(HostError::VerificationFailed { unit, reason }) => {
                client.debug_print(&format!("verification error: {unit}: {reason}"));
            }
            Err(other) => return Err(other),
        }
    }
    Ok(())
}
