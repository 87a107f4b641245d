//! Channel - typed calls over an open runtime session.
//!
//! The Channel serializes positional arguments into the JSON array the
//! call surface expects and deserializes results into protocol types.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::remote::RemoteCall;

/// Channel provides typed remote calls for an endpoint.
#[derive(Clone)]
pub struct Channel {
	remote: Arc<dyn RemoteCall>,
}

impl Channel {
	pub fn new(remote: Arc<dyn RemoteCall>) -> Self {
		Self { remote }
	}

	/// Sends a method call and awaits the response.
	///
	/// `args` must serialize to a JSON array; pass a tuple such as
	/// `(&cluster, user, password)` or `(name,)`.
	pub async fn send<P: Serialize, R: DeserializeOwned>(&self, method: &str, args: P) -> Result<R> {
		let args = serde_json::to_value(args)?;
		tracing::debug!(method, "remote call");
		let response = self.remote.call(method, args).await?;
		serde_json::from_value(response).map_err(Into::into)
	}

	/// Sends a method call with no arguments.
	pub async fn send_no_args<R: DeserializeOwned>(&self, method: &str) -> Result<R> {
		self.send(method, Value::Array(Vec::new())).await
	}

	/// Sends a method call whose result is ignored.
	pub async fn send_no_result<P: Serialize>(&self, method: &str, args: P) -> Result<()> {
		let _: Value = self.send(method, args).await?;
		Ok(())
	}
}
