//! WebSocket transport to the automation bridge.
//!
//! Each JSON-RPC message travels as one text frame. The transport is split
//! into a sender (owned by the connection's writer task) and a receiver
//! (run on its own task, forwarding parsed frames into an unbounded channel).


use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::{Error, Result};

/// Outbound half of a transport.
#[async_trait]
pub trait Transport: Send {
	/// Send one JSON message.
	async fn send(&mut self, message: Value) -> Result<()>;

	/// Close the transport. Further sends fail.
	async fn close(&mut self);
}

/// Inbound half of a transport.
#[async_trait]
pub trait TransportReceiver: Send {
	/// Read frames until the peer closes, forwarding each parsed message.
	async fn run(self: Box<Self>) -> Result<()>;
}

/// Both halves plus the channel the receiver feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// JSON-over-WebSocket transport.
pub struct WebSocketTransport<S> {
	ws: WebSocketStream<S>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl WebSocketTransport<MaybeTlsStream<TcpStream>> {
	/// Connect to a bridge URL such as `ws://127.0.0.1:1545/`.
	pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<Value>)> {
		tracing::debug!(%url, "connecting to automation bridge");
		let (ws, _response) = connect_async(url).await.map_err(|e| Error::ConnectionFailed {
			host_port: url.to_string(),
			reason: e.to_string(),
		})?;
		Ok(Self::new(ws))
	}
}

impl<S> WebSocketTransport<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	pub fn new(ws: WebSocketStream<S>) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		(Self { ws, message_tx }, message_rx)
	}

	pub fn into_parts(self) -> (WebSocketTransportSender<S>, WebSocketTransportReceiver<S>) {
		let (sink, stream) = self.ws.split();
		(
			WebSocketTransportSender { sink },
			WebSocketTransportReceiver {
				stream,
				message_tx: self.message_tx,
			},
		)
	}

	pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
		let (sender, receiver) = self.into_parts();
		TransportParts {
			sender: Box::new(sender),
			receiver: Box::new(receiver),
			message_rx,
		}
	}
}

pub struct WebSocketTransportSender<S> {
	sink: SplitSink<WebSocketStream<S>, Message>,
}

#[async_trait]
impl<S> Transport for WebSocketTransportSender<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	async fn send(&mut self, message: Value) -> Result<()> {
		let text = serde_json::to_string(&message)?;
		self.sink
			.send(Message::Text(text.into()))
			.await
			.map_err(|e| Error::TransportError(format!("Failed to write frame: {e}")))
	}

	async fn close(&mut self) {
		if let Err(e) = self.sink.close().await {
			tracing::debug!(error = %e, "websocket close failed");
		}
	}
}

pub struct WebSocketTransportReceiver<S> {
	stream: SplitStream<WebSocketStream<S>>,
	message_tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl<S> TransportReceiver for WebSocketTransportReceiver<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	async fn run(mut self: Box<Self>) -> Result<()> {
		while let Some(frame) = self.stream.next().await {
			let frame = frame.map_err(|e| Error::TransportError(format!("Failed to read frame: {e}")))?;
			let message: Value = match frame {
				Message::Text(text) => serde_json::from_str(&text)?,
				Message::Binary(bytes) => serde_json::from_slice(&bytes)?,
				Message::Close(_) => break,
				_ => continue,
			};

			if self.message_tx.send(message).is_err() {
				// Connection dropped its receiver; nothing left to deliver to.
				break;
			}
		}
		Ok(())
	}
}
