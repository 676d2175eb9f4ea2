//! One-shot client backed by a compiled probe script on disk.

use super::{Client, ClientCore, Runtime};
use crate::domain::CodeUnit;
use crate::host::Host;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use weft_common::ProbeScript;

/// Resolved output destination for a script client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDest {
    /// The foreground sink: the process's standard output.
    Stdout,
    /// A concrete file, already `${ts}`-expanded.
    File(PathBuf),
}

impl fmt::Display for OutputDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDest::Stdout => f.write_str("stdout"),
            OutputDest::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Client for a script loaded from disk. Runs once per loader invocation.
pub struct FileClient {
    core: ClientCore,
    script_path: PathBuf,
    output: OutputDest,
}

impl FileClient {
    /// Open the output destination and wrap the parsed script.
    ///
    /// # Errors
    /// Returns the I/O error from creating the output file.
    pub fn new(
        host: Arc<dyn Host>,
        script_path: &Path,
        script: ProbeScript,
        output: OutputDest,
        debug: bool,
    ) -> io::Result<Self> {
        let runtime = match &output {
            OutputDest::Stdout => Runtime::to_writer(Box::new(io::stdout())),
            OutputDest::File(path) => {
                Runtime::to_writer(Box::new(BufWriter::new(File::create(path)?)))
            }
        };
        Ok(Self {
            core: ClientCore::new(host, script, runtime, debug),
            script_path: script_path.to_path_buf(),
            output,
        })
    }
}

impl Client for FileClient {
    fn description(&self) -> String {
        format!("script {} ({} -> {})", self.core.script_name(), self.script_path.display(), self.output)
    }

    fn should_add_transformer(&self) -> bool {
        self.core.should_add_transformer()
    }

    fn register_transformer(&self) {
        self.core.register_transformer();
    }

    fn is_candidate(&self, unit: &CodeUnit) -> bool {
        self.core.is_candidate(unit)
    }

    fn start_retransform(&self, count: usize) {
        self.core.start_retransform(count);
    }

    fn skip_retransforms(&self) {
        self.core.skip_retransforms();
    }

    fn runtime(&self) -> &Runtime {
        self.core.runtime()
    }

    fn debug_print(&self, msg: &str) {
        self.core.debug_print(msg);
    }
}
