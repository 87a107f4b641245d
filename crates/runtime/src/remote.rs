//! The opaque call surface of the platform's native automation layer.
//!
//! A [`RemoteCall`] is one open runtime session: it takes a method name
//! and a JSON argument array and returns a JSON value or a
//! [`Error::Remote`](crate::Error::Remote) failure. A [`Launcher`] opens
//! such sessions. Nothing above this module knows how calls are carried.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Boxed future returned by the object-safe call surface.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Kind of runtime session to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeFlavor {
	/// Session with a server agent.
	Agent,
	/// Session with a single working process.
	WorkingProcess,
}

impl fmt::Display for RuntimeFlavor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RuntimeFlavor::Agent => f.write_str("agent"),
			RuntimeFlavor::WorkingProcess => f.write_str("working-process"),
		}
	}
}

/// Platform version constraint a runtime must satisfy (e.g. `~> 8.3.10.0`).
///
/// Opaque to this crate; interpreted by whoever opens the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformRequirement(String);

impl PlatformRequirement {
	pub fn new(requirement: impl Into<String>) -> Self {
		Self(requirement.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PlatformRequirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One open runtime session.
pub trait RemoteCall: Send + Sync {
	/// Invoke `method` with positional `args` (a JSON array) and await the result.
	fn call(&self, method: &str, args: Value) -> BoxFuture<'_, Result<Value>>;

	/// Close the session. Closing twice is a no-op.
	fn close(&self) -> BoxFuture<'_, ()>;

	/// True until [`close`](Self::close) is called or the peer goes away.
	fn is_open(&self) -> bool;
}

/// Opens runtime sessions.
pub trait Launcher: Send + Sync {
	/// Start a runtime of `flavor` bound to `host_port`.
	///
	/// Fails when the endpoint is unreachable or the platform does not
	/// satisfy `requirement`.
	fn launch<'a>(
		&'a self,
		flavor: RuntimeFlavor,
		host_port: &'a str,
		requirement: &'a PlatformRequirement,
	) -> BoxFuture<'a, Result<Arc<dyn RemoteCall>>>;
}
