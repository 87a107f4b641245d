//! [`Launcher`] that opens runtime sessions through an automation bridge.
//!
//! The bridge is a small host-side service that owns the platform's native
//! automation objects and exposes them as JSON-RPC over WebSocket. One
//! WebSocket connection carries one runtime session. The session is opened
//! by an `__open__` request naming the flavor, target address and platform
//! requirement; every later request is a plain method call on that session.

use std::sync::Arc;

use serde::Serialize;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::remote::{BoxFuture, Launcher, PlatformRequirement, RemoteCall, RuntimeFlavor};
use crate::transport::WebSocketTransport;

/// Method that binds a fresh bridge connection to a native runtime.
pub const OPEN_METHOD: &str = "__open__";

/// Default bridge address.
pub const DEFAULT_BRIDGE_URL: &str = "ws://127.0.0.1:1545/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenParams<'a> {
	flavor: RuntimeFlavor,
	host_port: &'a str,
	requirement: &'a PlatformRequirement,
}

/// Opens sessions over WebSocket connections to a bridge.
#[derive(Debug, Clone)]
pub struct BridgeLauncher {
	url: String,
}

impl BridgeLauncher {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	async fn open_session(
		&self,
		flavor: RuntimeFlavor,
		host_port: &str,
		requirement: &PlatformRequirement,
	) -> Result<Arc<dyn RemoteCall>> {
		let (transport, message_rx) = WebSocketTransport::connect(&self.url).await?;
		let connection = Connection::start(transport.into_transport_parts(message_rx));

		let params = serde_json::to_value(OpenParams {
			flavor,
			host_port,
			requirement,
		})?;

		if let Err(err) = connection.send_message(OPEN_METHOD, params).await {
			connection.close().await;
			return Err(match err {
				Error::Remote { name, message } => Error::ConnectionFailed {
					host_port: host_port.to_string(),
					reason: format!("{name}: {message}"),
				},
				other => other,
			});
		}

		tracing::debug!(%flavor, %host_port, bridge = %self.url, "bridge session opened");
		Ok(connection as Arc<dyn RemoteCall>)
	}
}

impl Default for BridgeLauncher {
	fn default() -> Self {
		Self::new(DEFAULT_BRIDGE_URL)
	}
}

impl Launcher for BridgeLauncher {
	fn launch<'a>(
		&'a self,
		flavor: RuntimeFlavor,
		host_port: &'a str,
		requirement: &'a PlatformRequirement,
	) -> BoxFuture<'a, Result<Arc<dyn RemoteCall>>> {
		Box::pin(self.open_session(flavor, host_port, requirement))
	}
}
