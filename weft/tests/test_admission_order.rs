use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use weft::admission::Coordinator;
use weft::client::{Client, Runtime};
use weft::domain::{CodeUnit, HostError};
use weft::host::{Host, SearchPathKind, Transformer};
use weft::transform::TransformPolicy;

/// Host that fails the test if retransform is ever entered concurrently.
struct SerializingHost {
    busy: AtomicBool,
    overlapped: AtomicBool,
}

impl SerializingHost {
    fn new() -> Self {
        Self { busy: AtomicBool::new(false), overlapped: AtomicBool::new(false) }
    }
}

impl Host for SerializingHost {
    fn loaded_units(&self) -> Vec<CodeUnit> {
        vec![CodeUnit::new(1, "app::core".to_string())]
    }

    fn is_modifiable(&self, _unit: &CodeUnit) -> bool {
        true
    }

    fn retransform(&self, _units: &[CodeUnit]) -> Result<(), HostError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        // Widen the window so any overlap would actually be observed.
        thread::sleep(Duration::from_millis(2));
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn add_transformer(&self, _transformer: Arc<dyn Transformer>) {}

    fn append_search_path(&self, _kind: SearchPathKind, _path: &Path) -> Result<(), HostError> {
        Ok(())
    }
}

/// Client that records the order its admission started in.
struct OrderedClient {
    index: usize,
    log: Arc<Mutex<Vec<usize>>>,
    runtime: Runtime,
}

impl OrderedClient {
    fn new(index: usize, log: Arc<Mutex<Vec<usize>>>) -> Self {
        Self { index, log, runtime: Runtime::to_writer(Box::new(io::sink())) }
    }
}

impl Client for OrderedClient {
    fn description(&self) -> String {
        format!("ordered client {}", self.index)
    }

    fn should_add_transformer(&self) -> bool {
        true
    }

    fn register_transformer(&self) {
        self.log.lock().unwrap().push(self.index);
    }

    fn is_candidate(&self, _unit: &CodeUnit) -> bool {
        true
    }

    fn start_retransform(&self, _count: usize) {}

    fn skip_retransforms(&self) {}

    fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    fn debug_print(&self, _msg: &str) {}
}

#[test]
fn test_submissions_admitted_in_arrival_order() {
    let host = Arc::new(SerializingHost::new());
    let coordinator = Coordinator::new(Arc::clone(&host) as Arc<dyn Host>, TransformPolicy::Batch);
    let log = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..16)
        .map(|i| coordinator.submit(Arc::new(OrderedClient::new(i, Arc::clone(&log)))))
        .collect();
    for handle in handles {
        handle.wait();
    }

    assert_eq!(*log.lock().unwrap(), (0..16).collect::<Vec<_>>());
    assert!(!host.overlapped.load(Ordering::SeqCst));
}

#[test]
fn test_concurrent_submitters_never_overlap_host_calls() {
    let host = Arc::new(SerializingHost::new());
    let coordinator =
        Arc::new(Coordinator::new(Arc::clone(&host) as Arc<dyn Host>, TransformPolicy::Batch));
    let log = Arc::new(Mutex::new(Vec::new()));

    let submitters: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            let log = Arc::clone(&log);
            thread::spawn(move || {
                coordinator.submit(Arc::new(OrderedClient::new(i, log))).wait();
            })
        })
        .collect();
    for submitter in submitters {
        submitter.join().expect("submitter panicked");
    }

    assert_eq!(log.lock().unwrap().len(), 8);
    assert!(!host.overlapped.load(Ordering::SeqCst));
}

#[test]
fn test_admitted_transformer_clients_are_retained() {
    let host = Arc::new(SerializingHost::new());
    let coordinator = Coordinator::new(host as Arc<dyn Host>, TransformPolicy::Batch);
    let log = Arc::new(Mutex::new(Vec::new()));

    coordinator.submit(Arc::new(OrderedClient::new(0, Arc::clone(&log)))).wait();
    coordinator.submit(Arc::new(OrderedClient::new(1, log))).wait();

    assert_eq!(coordinator.active_clients(), 2);
}
