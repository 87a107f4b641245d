//! Error types for the administration runtime.

use ibadm_protocol::InvalidDropMode;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message fragment the native layer reports when the peer dropped the session.
pub const DISCONNECT_SIGNATURE: &str = "descr=10054";

/// Errors that can occur while administering a cluster.
#[derive(Debug, Error)]
pub enum Error {
	/// Invalid argument provided to a method.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// TCP probe against an endpoint failed.
	#[error("Service {host_port} not available: {reason}")]
	Unreachable { host_port: String, reason: String },

	/// Remote call failed on the server side.
	#[error("{name}: {message}")]
	Remote {
		/// Error class reported by the native layer
		name: String,
		/// Human-readable error message
		message: String,
	},

	/// Operation needs a running runtime but none is open.
	#[error("Not connected: {0}")]
	NotConnected(String),

	/// Failed to open a runtime against an endpoint.
	#[error("Failed to connect to {host_port}: {reason}")]
	ConnectionFailed { host_port: String, reason: String },

	/// Cluster object was never attached to a server agent.
	#[error("Cluster `{0}` must be attached to a server agent")]
	NotAttached(String),

	/// Cluster is not registered on the agent it was attached to.
	#[error("Cluster `{cluster}` not found on server `{server}`")]
	ClusterNotFound { cluster: String, server: String },

	/// Infobase is not registered in the cluster.
	#[error("Infobase `{name}` not exists on `{server}`")]
	InfobaseNotFound { name: String, server: String },

	/// No working process of the cluster is running and reachable.
	#[error("No alive working processes found in cluster `{0}`")]
	NoAliveWorkingProcess(String),

	/// Transport-level error (WebSocket communication).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Protocol-level error (JSON-RPC framing).
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Bridge channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub fn invalid_argument(msg: impl Into<String>) -> Self {
		Self::InvalidArgument(msg.into())
	}

	pub fn remote(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Remote {
			name: name.into(),
			message: message.into(),
		}
	}

	/// Returns true if the remote call itself failed (as opposed to local or transport failures).
	pub fn is_remote(&self) -> bool {
		matches!(self, Error::Remote { .. })
	}

	/// Returns true if this is the native "connection reset by peer" failure.
	pub fn is_disconnect(&self) -> bool {
		match self {
			Error::Remote { message, .. } => message.contains(DISCONNECT_SIGNATURE),
			_ => false,
		}
	}

	/// Returns true for configuration errors that must never be retried.
	pub fn is_invalid_argument(&self) -> bool {
		matches!(self, Error::InvalidArgument(_))
	}
}

impl From<InvalidDropMode> for Error {
	fn from(err: InvalidDropMode) -> Self {
		Error::InvalidArgument(err.to_string())
	}
}

impl From<std::convert::Infallible> for Error {
	fn from(never: std::convert::Infallible) -> Self {
		match never {}
	}
}
