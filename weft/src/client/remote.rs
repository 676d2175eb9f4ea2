//! Persistent client backed by an accepted control-plane connection.

use super::{Client, ClientCore, Runtime};
use crate::domain::CodeUnit;
use crate::host::Host;
use std::io::{self, BufReader};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;
use weft_common::{read_command, Command};

/// How long the initial instrument request may take to arrive before the
/// connection is rejected. Without a bound, a silent connection would
/// wedge the acceptor loop.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one accepted connection. Stays registered as long as the
/// active-client registry holds it; the connection doubles as its
/// acknowledgement channel.
pub struct RemoteClient {
    core: ClientCore,
    peer: SocketAddr,
}

impl RemoteClient {
    /// Read the instrument request off a freshly accepted connection.
    ///
    /// # Errors
    /// Timeout, close, or a malformed first message; the caller logs the
    /// error and drops only this connection.
    pub fn accept(host: Arc<dyn Host>, stream: TcpStream, debug: bool) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let script = match read_command(&mut reader)? {
            Command::Instrument { script } => script,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("expected instrument request, got {other:?}"),
                ))
            }
        };
        stream.set_read_timeout(None)?;

        Ok(Self { core: ClientCore::new(host, script, Runtime::over_stream(stream), debug), peer })
    }

    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Client for RemoteClient {
    fn description(&self) -> String {
        format!("remote client {} running {}", self.peer, self.core.script_name())
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
