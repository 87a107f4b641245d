//! JSON-RPC connection to the automation bridge.
//!
//! This module implements the request/response correlation layer on top of the transport.
//! It handles:
//! - Generating unique request IDs
//! - Correlating responses with pending requests
//! - Failing pending requests when the bridge goes away
//!
//! # Message Flow
//!
//! 1. Caller invokes `send_message()` with method and params
//! 2. Connection generates unique ID and creates oneshot channel
//! 3. Request is queued for the writer task and sent via transport
//! 4. Caller awaits on the oneshot receiver
//! 5. Dispatch loop receives the response from the transport receiver
//! 6. Response is correlated by ID and sent via the oneshot channel


use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::remote::{BoxFuture, RemoteCall};
use crate::transport::TransportParts;

/// Method the bridge understands as "release the native runtime".
pub const CLOSE_METHOD: &str = "__close__";

/// Protocol request message sent to the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request ID for correlating responses
	pub id: u32,
	/// Method name to invoke
	pub method: String,
	/// Positional arguments
	pub params: Value,
}

/// Protocol response message from the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Request ID this response correlates to
	pub id: u32,
	/// Success result (mutually exclusive with error)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Remote failure details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// Error message
	pub message: String,
	/// Native error class name
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

/// Discriminated union of inbound messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field)
	Response(Response),
	/// Unknown message type (forward-compatible catch-all)
	Unknown(Value),
}

enum Outbound {
	Frame(Value),
	Close,
}

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<TokioMutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
	id: u32,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u32, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let id = self.id;
		let callbacks = Arc::clone(&self.callbacks);

		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move {
				if callbacks.lock().await.remove(&id).is_some() {
					tracing::debug!(id, "CancelGuard: removed orphaned callback");
				}
			});
		}
	}
}

/// Future returned by [`Connection::send_message`] with automatic cancellation cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// JSON-RPC connection to the automation bridge.
///
/// One connection carries exactly one native runtime session.
pub struct Connection {
	/// Sequential request ID counter
	last_id: AtomicU32,
	/// Pending request callbacks keyed by request ID
	callbacks: CallbackMap,
	/// Channel for sending outbound messages to the writer task
	outbound_tx: mpsc::UnboundedSender<Outbound>,
	/// Cleared on close or when the bridge goes away
	open: Arc<AtomicBool>,
}

impl Connection {
	/// Create a connection and spawn its reader, writer and dispatch tasks.
	pub fn start(parts: TransportParts) -> Arc<Self> {
		let TransportParts {
			mut sender,
			receiver,
			mut message_rx,
		} = parts;

		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
		let connection = Arc::new(Self {
			last_id: AtomicU32::new(0),
			callbacks: Arc::new(TokioMutex::new(HashMap::new())),
			outbound_tx,
			open: Arc::new(AtomicBool::new(true)),
		});

		tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				tracing::error!("Transport read error: {}", e);
			}
		});

		tokio::spawn(async move {
			while let Some(outbound) = outbound_rx.recv().await {
				match outbound {
					Outbound::Frame(message) => {
						if let Err(e) = sender.send(message).await {
							tracing::error!("Transport write error: {}", e);
							break;
						}
					}
					Outbound::Close => break,
				}
			}
			sender.close().await;
		});

		let dispatcher = Arc::clone(&connection);
		tokio::spawn(async move {
			while let Some(message_value) = message_rx.recv().await {
				match serde_json::from_value::<Message>(message_value) {
					Ok(message) => {
						if let Err(e) = dispatcher.dispatch(message).await {
							tracing::error!("Error dispatching message: {}", e);
						}
					}
					Err(e) => tracing::error!("Failed to parse message: {}", e),
				}
			}
			dispatcher.shutdown().await;
		});

		connection
	}

	/// Sends a request and awaits the response.
	pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
		let (tx, rx) = oneshot::channel();
		let id = {
			// Checked under the callbacks lock so shutdown either sees this callback or we see it closed.
			let mut callbacks = self.callbacks.lock().await;
			if !self.open.load(Ordering::SeqCst) {
				return Err(Error::ChannelClosed);
			}
			let id = self.last_id.fetch_add(1, Ordering::SeqCst);
			callbacks.insert(id, tx);
			id
		};
		tracing::debug!("Sending message: id={}, method='{}'", id, method);

		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};
		let request_value = serde_json::to_value(&request)?;

		if self.outbound_tx.send(Outbound::Frame(request_value)).is_err() {
			tracing::error!("Failed to queue message: outbound channel closed");
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	async fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let callback = self.callbacks.lock().await.remove(&response.id).ok_or_else(|| {
					Error::ProtocolError(format!("Cannot find request to respond: id={}", response.id))
				})?;

				let result = match response.error {
					Some(error) => Err(parse_remote_error(error)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				let _ = callback.send(result);
				Ok(())
			}
			Message::Unknown(value) => {
				tracing::debug!(
					"Unknown message type (forward-compatible, ignored): {}",
					serde_json::to_string(&value).unwrap_or_else(|_| "<serialization failed>".to_string())
				);
				Ok(())
			}
		}
	}

	/// Mark the connection closed and fail every pending request.
	async fn shutdown(&self) {
		let pending: Vec<_> = {
			let mut callbacks = self.callbacks.lock().await;
			self.open.store(false, Ordering::SeqCst);
			callbacks.drain().collect()
		};
		for (id, callback) in pending {
			tracing::debug!(id, "failing pending request: bridge went away");
			let _ = callback.send(Err(Error::ChannelClosed));
		}
	}

	/// Release the native runtime and close the transport.
	pub async fn close(&self) {
		if !self.open.swap(false, Ordering::SeqCst) {
			return;
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let request = Request {
			id,
			method: CLOSE_METHOD.to_string(),
			params: Value::Array(Vec::new()),
		};
		if let Ok(value) = serde_json::to_value(&request) {
			let _ = self.outbound_tx.send(Outbound::Frame(value));
		}
		let _ = self.outbound_tx.send(Outbound::Close);
	}
}

/// Converts [`ErrorPayload`] from the bridge into [`Error::Remote`].
fn parse_remote_error(error: ErrorPayload) -> Error {
	Error::Remote {
		name: error.name.unwrap_or_else(|| "Error".to_string()),
		message: error.message,
	}
}

impl RemoteCall for Connection {
	fn call(&self, method: &str, args: Value) -> BoxFuture<'_, Result<Value>> {
		let method = method.to_string();
		Box::pin(async move { self.send_message(&method, args).await })
	}

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(Connection::close(self))
	}

	fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst)
	}
}
