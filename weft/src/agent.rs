//! Agent assembly and startup sequence.
//!
//! Startup order matters: search paths are appended before any script can
//! be admitted, local scripts are admitted before the control port opens,
//! and only then do remote clients get a listener to reach.

use crate::admission::Coordinator;
use crate::config::Settings;
use crate::host::{Host, SearchPathKind};
use crate::scripts;
use crate::server::Server;
use crate::transform::TransformPolicy;
use log::{debug, error, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use weft_common::PACK_EXT;

/// A fully started agent: coordinator plus, unless disabled, the
/// control-plane server.
pub struct Agent {
    settings: Settings,
    coordinator: Arc<Coordinator>,
    server: Option<Server>,
}

impl Agent {
    /// Parse arguments and run the startup sequence to completion. Local
    /// scripts are admitted synchronously; by the time this returns they
    /// have all been acknowledged.
    ///
    /// A server that fails to start is reported and skipped rather than
    /// failing the agent: local script clients keep their instrumentation.
    #[must_use]
    pub fn start(args: &HashMap<String, String>, host: Arc<dyn Host>) -> Self {
        let settings = Settings::from_args(args);
        debug!("agent starting with {settings:?}");

        append_search_paths(&settings, host.as_ref());

        let policy = TransformPolicy::from_debug(settings.debug);
        let coordinator = Arc::new(Coordinator::new(Arc::clone(&host), policy));

        scripts::run(&settings, &host, &coordinator);

        let server = if settings.no_server {
            debug!("noServer is set, not starting the control-plane server");
            None
        } else {
            match Server::start(&settings, host, Arc::clone(&coordinator)) {
                Ok(server) => Some(server),
                Err(e) => {
                    error!("cannot start server on port {}: {e}", settings.port);
                    None
                }
            }
        };

        Self { settings, coordinator, server }
    }

    /// Address of the control-plane listener, if one is running.
    #[must_use]
    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(Server::local_addr)
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Stop accepting new remote clients. Existing instrumentation stays.
    pub fn shutdown(&self) {
        if let Some(server) = &self.server {
            server.shutdown();
        }
    }
}

/// Append the configured boot and system search paths, jar packs only.
///
/// Entries that are not regular `.pack` files are skipped with a
/// diagnostic. A host rejection abandons the rest of that list but not
/// the other one.
fn append_search_paths(settings: &Settings, host: &dyn Host) {
    let lists = [
        (SearchPathKind::Boot, &settings.boot_search_path),
        (SearchPathKind::System, &settings.system_search_path),
    ];
    for (kind, entries) in lists {
        for path in entries {
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(PACK_EXT) {
                debug!("ignoring {kind:?} search path entry {}: not a .{PACK_EXT} file", path.display());
                continue;
            }
            if let Err(e) = host.append_search_path(kind, path) {
                warn!("appending {} to the {kind:?} search path failed: {e}", path.display());
                break;
            }
        }
    }
}
