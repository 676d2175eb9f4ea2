//! # Weft - In-Process Dynamic Instrumentation Agent
//!
//! Weft lives inside a host process and lets probe scripts, local or
//! remote, instrument the host's loaded code units at runtime. Scripts
//! select units by name pattern; the agent drives the host's
//! retransformation mechanism to apply them and streams acknowledgements
//! back to whoever asked.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │    Script Loader     │      │  Connection Acceptor │
//! │  (.probe files on    │      │   (TCP control       │
//! │   disk at startup)   │      │    plane, port 2020) │
//! └──────────┬───────────┘      └──────────┬───────────┘
//!            │ FileClient                  │ RemoteClient
//!            ▼                             ▼
//! ┌─────────────────────────────────────────────────────┐
//! │              Admission Coordinator                  │
//! │   single worker, strict FIFO, one ack per client    │
//! └──────────────────────────┬──────────────────────────┘
//!                            ▼
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │  Candidate Selector  │─────▶│ Transformation Driver│
//! │  (loaded units ∩     │      │  (batch, or per-unit │
//! │   script patterns)   │      │   under debug)       │
//! └──────────┬───────────┘      └──────────┬───────────┘
//!            │ populates                   │
//!            ▼                             ▼
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │     Unit Cache       │      │     Host Process     │
//! │  (memoized metadata) │      │  (retransformation)  │
//! └──────────────────────┘      └──────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`agent`]: Startup sequence wiring everything together
//! - [`admission`]: The serialized admission coordinator
//! - [`transform`]: Candidate selection and retransformation policies
//! - [`client`]: The [`client::Client`] trait and its file and remote
//!   implementations
//! - [`scripts`]: Loading of on-disk compiled probe scripts
//! - [`server`]: The control-plane TCP listener
//! - [`cache`]: Lazily populated per-unit metadata
//! - [`host`]: The trait boundary to the surrounding process
//! - [`config`]: Argument parsing into [`config::Settings`]
//! - [`domain`]: Core identifiers and error types
//! - [`exec`]: The single-worker executor and shutdown signal
//!
//! ## Serialization Invariant
//!
//! The host's retransformation mechanism is not safe under concurrent
//! invocation, so every admission, whatever its origin, runs alone on the
//! coordinator's worker. Local scripts are admitted one by one before the
//! control port opens, and the acceptor blocks on each remote admission
//! before accepting the next connection.

pub mod admission;
pub mod agent;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod exec;
pub mod host;
pub mod scripts;
pub mod server;
pub mod transform;

pub use agent::Agent;
