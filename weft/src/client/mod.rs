//! Client abstraction: the two admission sources and their runtime channel.
//!
//! A client is one instrumentation request, either a compiled probe script
//! picked up from disk ([`FileClient`], one-shot) or an accepted network
//! connection ([`RemoteClient`], persistent). Both variants share the same
//! flat capability surface consumed by the admission coordinator; there is
//! deliberately no deeper hierarchy than trait + two impls.

mod file;
mod remote;

pub use file::{FileClient, OutputDest};
pub use remote::RemoteClient;

use crate::domain::CodeUnit;
use crate::host::{Host, Transformer};
use log::debug;
use std::io::{self, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use weft_common::{write_command, Command, ProbeScript};

/// Capability surface every admission source implements.
pub trait Client: Send + Sync {
    /// Identity string for diagnostics.
    fn description(&self) -> String;

    /// Whether this client needs the host to watch future unit loads.
    /// A client with no active probes answers false and skips registration.
    fn should_add_transformer(&self) -> bool;

    /// Idempotently install this client's transformation logic as a
    /// listener for units loaded in the future.
    fn register_transformer(&self);

    /// Candidate predicate consumed by the selector.
    fn is_candidate(&self, unit: &CodeUnit) -> bool;

    /// Bookkeeping hook: a retransformation batch of `count` units starts.
    fn start_retransform(&self, count: usize);

    /// Bookkeeping hook: stop short-circuiting in-flight retransformation
    /// observation for the current batch.
    fn skip_retransforms(&self);

    /// Acknowledgement channel.
    fn runtime(&self) -> &Runtime;

    /// Diagnostic hook, no-op unless debug mode is active.
    fn debug_print(&self, msg: &str);
}

/// Per-client acknowledgement channel.
///
/// Sends the single Okay-or-Error outcome of one admission attempt as one
/// JSON line, either back over the client's socket or into its trace
/// output sink.
pub struct Runtime {
    sink: Mutex<Sink>,
}

enum Sink {
    Stream(TcpStream),
    Writer(Box<dyn Write + Send>),
}

impl Runtime {
    /// Channel writing into an owned sink (file client output).
    #[must_use]
    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self { sink: Mutex::new(Sink::Writer(writer)) }
    }

    /// Channel writing back over the client's own connection.
    #[must_use]
    pub fn over_stream(stream: TcpStream) -> Self {
        Self { sink: Mutex::new(Sink::Stream(stream)) }
    }

    /// Send one outcome message.
    ///
    /// # Errors
    /// Any underlying I/O error; the caller logs and gives up on the
    /// client rather than retrying.
    pub fn send(&self, command: &Command) -> io::Result<()> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *sink {
            Sink::Stream(stream) => write_command(stream, command),
            Sink::Writer(writer) => write_command(writer, command),
        }
    }
}

/// Transformer registration surface derived from a probe script.
struct ScriptTransformer {
    script: ProbeScript,
}

impl Transformer for ScriptTransformer {
    fn name(&self) -> &str {
        &self.script.name
    }

    fn wants(&self, unit: &CodeUnit) -> bool {
        self.script.matches_unit(&unit.name)
    }
}

/// Bookkeeping and host plumbing shared by both client variants.
pub(crate) struct ClientCore {
    host: Arc<dyn Host>,
    transformer: Arc<ScriptTransformer>,
    runtime: Runtime,
    registered: AtomicBool,
    pending_retransforms: AtomicUsize,
    skipping: AtomicBool,
    debug: bool,
}

impl ClientCore {
    pub(crate) fn new(host: Arc<dyn Host>, script: ProbeScript, runtime: Runtime, debug: bool) -> Self {
        Self {
            host,
            transformer: Arc::new(ScriptTransformer { script }),
            runtime,
            registered: AtomicBool::new(false),
            pending_retransforms: AtomicUsize::new(0),
            skipping: AtomicBool::new(false),
            debug,
        }
    }

    pub(crate) fn script_name(&self) -> &str {
        self.transformer.name()
    }

    pub(crate) fn should_add_transformer(&self) -> bool {
        self.transformer.script.has_probes()
    }

    pub(crate) fn register_transformer(&self) {
        if !self.registered.swap(true, Ordering::SeqCst) {
            self.host.add_transformer(Arc::clone(&self.transformer) as Arc<dyn Transformer>);
            self.debug_print("transformer registered");
        }
    }

    pub(crate) fn is_candidate(&self, unit: &CodeUnit) -> bool {
        self.transformer.wants(unit)
    }

    pub(crate) fn start_retransform(&self, count: usize) {
        self.pending_retransforms.store(count, Ordering::SeqCst);
        self.skipping.store(false, Ordering::SeqCst);
        self.debug_print(&format!("retransform batch of {count} starting"));
    }

    pub(crate) fn skip_retransforms(&self) {
        self.skipping.store(true, Ordering::SeqCst);
        self.pending_retransforms.store(0, Ordering::SeqCst);
    }

    pub(crate) fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub(crate) fn debug_print(&self, msg: &str) {
        if self.debug {
            debug!("[{}] {msg}", self.script_name());
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.pending_retransforms.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn is_skipping(&self) -> bool {
        self.skipping.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;

    struct NullHost {
        transformers: StdMutex<Vec<Arc<dyn Transformer>>>,
    }

    impl NullHost {
        fn new() -> Self {
            Self { transformers: StdMutex::new(Vec::new()) }
        }
    }

    impl Host for NullHost {
        fn loaded_units(&self) -> Vec<CodeUnit> {
            Vec::new()
        }
        fn is_modifiable(&self, _unit: &CodeUnit) -> bool {
            true
        }
        fn retransform(&self, _units: &[CodeUnit]) -> Result<(), crate::domain::HostError> {
            Ok(())
        }
        fn add_transformer(&self, transformer: Arc<dyn Transformer>) {
            self.transformers.lock().unwrap().push(transformer);
        }
        fn append_search_path(
            &self,
            _kind: crate::host::SearchPathKind,
            _path: &Path,
        ) -> Result<(), crate::domain::HostError> {
            Ok(())
        }
    }

    fn core(host: &Arc<NullHost>, patterns: &[&str]) -> ClientCore {
        let script = ProbeScript {
            name: "t".to_string(),
            unit_patterns: patterns.iter().map(ToString::to_string).collect(),
            payload: String::new(),
        };
        let host: Arc<dyn Host> = Arc::clone(host) as Arc<dyn Host>;
        ClientCore::new(host, script, Runtime::to_writer(Box::new(Vec::new())), false)
    }

    #[test]
    fn test_registration_is_idempotent() {
        let host = Arc::new(NullHost::new());
        let core = core(&host, &["app::*"]);
        core.register_transformer();
        core.register_transformer();
        assert_eq!(host.transformers.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_no_probes_no_transformer() {
        let host = Arc::new(NullHost::new());
        let core = core(&host, &[]);
        assert!(!core.should_add_transformer());
    }

    #[test]
    fn test_retransform_bookkeeping() {
        let host = Arc::new(NullHost::new());
        let core = core(&host, &["*"]);
        core.start_retransform(3);
        assert_eq!(core.pending(), 3);
        assert!(!core.is_skipping());
        core.skip_retransforms();
        assert!(core.is_skipping());
        assert_eq!(core.pending(), 0);
    }

    #[test]
    fn test_runtime_writes_one_json_line() {
        let buf: Arc<StdMutex<Vec<u8>>> = Arc::new(StdMutex::new(Vec::new()));

        struct Shared(Arc<StdMutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, data: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let runtime = Runtime::to_writer(Box::new(Shared(Arc::clone(&buf))));
        runtime.send(&Command::Okay).unwrap();

        let written = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.contains("okay"));
    }
}
