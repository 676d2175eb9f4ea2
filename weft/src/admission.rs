//! Serialized client admission.
//!
//! Every instrumentation-affecting request, local or remote, funnels
//! through one [`Coordinator`] backed by a single worker: admissions run
//! strictly in arrival order, one at a time, end to end. That serialization
//! is the central correctness property, because the host's retransformation
//! mechanism is not safe under concurrent invocation.
//!
//! Each admission ends with exactly one `Okay` or `Error` message on the
//! client's runtime channel. Host rejections become `Error`
//! acknowledgements; nothing that happens to one client can take the
//! worker down.

use crate::cache::UnitCache;
use crate::client::Client;
use crate::domain::HostError;
use crate::exec::{SerialExecutor, TaskHandle};
use crate::host::Host;
use crate::transform::{select_candidates, TransformDriver, TransformPolicy};
use log::warn;
use std::sync::{Arc, Mutex, PoisonError};
use weft_common::Command;

/// Admission coordinator: one worker, FIFO, one acknowledgement per client.
pub struct Coordinator {
    executor: SerialExecutor,
    shared: Arc<Shared>,
}

struct Shared {
    host: Arc<dyn Host>,
    cache: UnitCache,
    driver: TransformDriver,
    /// Clients that installed a transformer and were acknowledged Okay.
    /// Holding them here is what keeps a remote client's connection open
    /// past its admission.
    active: Mutex<Vec<Arc<dyn Client>>>,
}

impl Coordinator {
    #[must_use]
    pub fn new(host: Arc<dyn Host>, policy: TransformPolicy) -> Self {
        Self {
            executor: SerialExecutor::new("weft-admission"),
            shared: Arc::new(Shared {
                host,
                cache: UnitCache::new(),
                driver: TransformDriver::new(policy),
                active: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Enqueue one client for admission. The handle resolves once the
    /// outcome has been communicated to the client, success or failure.
    pub fn submit(&self, client: Arc<dyn Client>) -> TaskHandle {
        let shared = Arc::clone(&self.shared);
        self.executor.submit(move || admit(&shared, client))
    }

    /// Number of clients currently retained as active observers.
    #[must_use]
    pub fn active_clients(&self) -> usize {
        self.shared.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// One admission, end to end. Never propagates an error past this frame.
fn admit(shared: &Shared, client: Arc<dyn Client>) {
    client.debug_print("admission started");

    let outcome = run_admission(shared, client.as_ref());
    let command = match &outcome {
        Ok(()) => Command::Okay,
        Err(e) => {
            warn!("admission of {} failed: {e}", client.description());
            Command::Error { cause: e.to_string() }
        }
    };

    if let Err(e) = client.runtime().send(&command) {
        warn!("failed to acknowledge {}: {e}", client.description());
        return;
    }

    if outcome.is_ok() && client.should_add_transformer() {
        shared.active.lock().unwrap_or_else(PoisonError::into_inner).push(client);
    }
}

fn run_admission(shared: &Shared, client: &dyn Client) -> Result<(), HostError> {
    if !client.should_add_transformer() {
        client.debug_print("no active probes, skipping transformer registration");
        return Ok(());
    }

    client.register_transformer();
    client.debug_print("filtering loaded units");
    let candidates = select_candidates(shared.host.as_ref(), &shared.cache, client);
    if candidates.is_empty() {
        client.debug_print("no matching loaded units, nothing to retransform");
        return Ok(());
    }

    client.debug_print(&format!("retransforming {} units", candidates.len()));
    shared.driver.retransform(shared.host.as_ref(), client, &candidates)
}
