//! TCP reachability probe.
//!
//! A probe succeeds when a TCP connection to the port can be established
//! within the timeout. Nothing is sent; the stream is dropped immediately.

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

/// Default time allowed for a probe to connect.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Try to open a TCP connection to `host:port`.
///
/// Returns the underlying I/O error (or a `TimedOut` error) on failure.
pub async fn tcp_probe(host: &str, port: u16, timeout: Duration) -> io::Result<()> {
	match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
		Ok(Ok(_stream)) => Ok(()),
		Ok(Err(e)) => {
			debug!(error = %e, %host, port, "tcp probe failed");
			Err(e)
		}
		Err(_) => {
			debug!(%host, port, ?timeout, "tcp probe timed out");
			Err(io::Error::new(
				io::ErrorKind::TimedOut,
				format!("connect to {host}:{port} timed out after {}ms", timeout.as_millis()),
			))
		}
	}
}
