//! Control-plane listener and accept loop.
//!
//! Connections are accepted and admitted one at a time: the acceptor hands
//! each accepted stream to [`RemoteClient::accept`], submits the client,
//! and blocks on the admission handle before accepting again. A client
//! that misbehaves during its handshake costs only its own connection.
//!
//! The listener runs nonblocking and polls so that [`Server::shutdown`]
//! can stop the loop without a wakeup connection.

use crate::admission::Coordinator;
use crate::client::RemoteClient;
use crate::config::Settings;
use crate::domain::ServerError;
use crate::exec::Shutdown;
use crate::host::Host;
use log::{debug, info, warn};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Handle to the running control-plane listener.
pub struct Server {
    local_addr: SocketAddr,
    shutdown: Shutdown,
}

impl Server {
    /// Bind the control port and start the acceptor thread.
    ///
    /// Port 0 binds an ephemeral port; the actual address is available from
    /// [`Server::local_addr`].
    ///
    /// # Errors
    /// [`ServerError::Bind`] when the port cannot be bound, or the I/O
    /// error from switching the listener to nonblocking mode.
    pub fn start(
        settings: &Settings,
        host: Arc<dyn Host>,
        coordinator: Arc<Coordinator>,
    ) -> Result<Self, ServerError> {
        let port = settings.port;
        let listener = TcpListener::bind(("0.0.0.0", port))
            .map_err(|source| ServerError::Bind { port, source })?;
        let local_addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Shutdown::new();
        let acceptor_shutdown = shutdown.clone();
        let debug_mode = settings.debug;
        thread::Builder::new()
            .name("weft-acceptor".to_string())
            .spawn(move || accept_loop(&listener, &host, &coordinator, &acceptor_shutdown, debug_mode))?;

        info!("listening for instrumentation clients on {local_addr}");
        Ok(Self { local_addr, shutdown })
    }

    /// Address the listener actually bound.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Ask the acceptor loop to stop. Already-admitted clients are not
    /// affected; the loop exits at its next poll.
    pub fn shutdown(&self) {
        self.shutdown.signal();
    }
}

fn accept_loop(
    listener: &TcpListener,
    host: &Arc<dyn Host>,
    coordinator: &Arc<Coordinator>,
    shutdown: &Shutdown,
    debug_mode: bool,
) {
    loop {
        if shutdown.is_signalled() {
            debug!("acceptor loop stopping");
            return;
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!("accepted connection from {peer}");
                let client = stream
                    .set_nonblocking(false)
                    .and_then(|()| RemoteClient::accept(Arc::clone(host), stream, debug_mode));
                match client {
                    Ok(client) => coordinator.submit(Arc::new(client)).wait(),
                    Err(e) => warn!("rejecting connection from {peer}: {e}"),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                warn!("accept failed: {e}");
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}
