//! Administration runtime - sessions, transport and endpoint plumbing
//!
//! This crate provides the low-level infrastructure shared by every
//! administration endpoint:
//!
//! - **Call surface**: [`RemoteCall`] and [`Launcher`], the opaque native automation layer
//! - **Runtime**: lazily started, stoppable session per endpoint
//! - **Authentication**: connect-then-authenticate state machine
//! - **Endpoint**: `host[:port]` addressing and TCP liveness probes
//! - **Bridge**: JSON-RPC over WebSocket implementation of the call surface
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │    ibadm     │  Agent, Cluster, WpConnection
//! └──────┬───────┘
//!        │ AuthenticatableEndpoint
//! ┌──────▼───────┐
//! │ibadm-runtime │  This crate
//! │  ┌────────┐  │
//! │  │Runtime │  │  Session lifecycle
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Conn   │  │  JSON-RPC correlation
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket transport
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod auth;
pub mod bridge;
pub mod channel;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod probe;
pub mod remote;
pub mod runtime;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root
pub use auth::AuthenticatableEndpoint;
pub use bridge::{BridgeLauncher, DEFAULT_BRIDGE_URL};
pub use channel::Channel;
pub use connection::{Connection, Message, Request, Response};
pub use endpoint::Endpoint;
pub use error::{DISCONNECT_SIGNATURE, Error, Result};
pub use probe::{DEFAULT_PROBE_TIMEOUT, tcp_probe};
pub use remote::{BoxFuture, Launcher, PlatformRequirement, RemoteCall, RuntimeFlavor};
pub use runtime::Runtime;
pub use transport::{
	Transport, TransportParts, TransportReceiver, WebSocketTransport, WebSocketTransportReceiver,
	WebSocketTransportSender,
};
