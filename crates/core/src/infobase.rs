//! Infobase reference and the credentials a working process connection needs.

use ibadm_protocol::Credentials;
use serde::{Deserialize, Serialize};

/// The infobase an administration operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfobaseRef {
	name: String,
	#[serde(flatten)]
	credentials: Credentials,
	#[serde(default)]
	unlock_code: String,
}

impl InfobaseRef {
	pub fn new(name: impl Into<String>, credentials: Credentials, unlock_code: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			credentials,
			unlock_code: unlock_code.into(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Infobase administrator credentials.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Permission code used to lock sessions; empty when none is configured.
	pub fn unlock_code(&self) -> &str {
		&self.unlock_code
	}

	/// Case-insensitive name match.
	pub fn is_named(&self, name: &str) -> bool {
		self.name.eq_ignore_ascii_case(name)
	}
}

/// Credentials for the two authentication layers of a working process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayeredCredentials {
	/// Cluster administrator, sent with `AuthenticateAdmin`.
	pub cluster: Credentials,
	/// Infobase administrator, sent with `AddAuthentication`.
	pub infobase: Credentials,
}

impl LayeredCredentials {
	pub fn new(cluster: Credentials, infobase: Credentials) -> Self {
		Self { cluster, infobase }
	}
}
