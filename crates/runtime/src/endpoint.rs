//! Server endpoint addressing and liveness.
//!
//! An [`Endpoint`] is parsed from a `host[:port]` string, keeps the
//! credentials for that server and can probe the port over TCP. Two
//! endpoints are the same server when host (case-insensitively) and
//! port match; credentials play no part in equality.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::time::Duration;

use ibadm_protocol::Credentials;

use crate::error::{Error, Result};
use crate::probe::{DEFAULT_PROBE_TIMEOUT, tcp_probe};

#[derive(Clone)]
pub struct Endpoint {
	host: String,
	port: u16,
	credentials: Credentials,
	probe_timeout: Duration,
}

impl Endpoint {
	/// Parse `host[:port]`, falling back to `default_port` when the port is omitted.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`] if the host is empty or the port is not a number.
	pub fn parse(host_port: &str, default_port: u16, credentials: Credentials) -> Result<Self> {
		if host_port.trim().is_empty() {
			return Err(Error::invalid_argument("Host name require"));
		}

		let mut parts = host_port.split(':');
		let host = parts.next().unwrap_or_default().trim();
		if host.is_empty() {
			return Err(Error::invalid_argument(format!("Invalid host_name for `{host_port}'")));
		}

		let port = match parts.next().map(str::trim).filter(|p| !p.is_empty()) {
			Some(raw) => raw
				.parse::<u16>()
				.map_err(|_| Error::invalid_argument(format!("Invalid port `{raw}' for `{host_port}'")))?,
			None => default_port,
		};

		Ok(Self {
			host: host.to_string(),
			port,
			credentials,
			probe_timeout: DEFAULT_PROBE_TIMEOUT,
		})
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	pub fn probe_timeout(&self) -> Duration {
		self.probe_timeout
	}

	/// Canonical `host:port` string.
	pub fn host_port(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	/// Probe the TCP port, returning the probe's own diagnostic on failure.
	pub async fn probe(&self) -> io::Result<()> {
		tcp_probe(&self.host, self.port, self.probe_timeout).await
	}

	/// True if the TCP port accepts connections.
	pub async fn ping(&self) -> bool {
		self.probe().await.is_ok()
	}

	/// Probe the port, converting failure into [`Error::Unreachable`].
	pub async fn ensure_reachable(&self) -> Result<()> {
		self.probe().await.map_err(|e| Error::Unreachable {
			host_port: self.host_port(),
			reason: e.to_string(),
		})
	}
}

impl PartialEq for Endpoint {
	fn eq(&self, other: &Self) -> bool {
		self.host.eq_ignore_ascii_case(&other.host) && self.port == other.port
	}
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.host.to_ascii_uppercase().hash(state);
		self.port.hash(state);
	}
}

impl fmt::Debug for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Endpoint")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("credentials", &self.credentials)
			.finish()
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.host, self.port)
	}
}
