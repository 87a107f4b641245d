//! Credentials passed to the authentication primitives.

use serde::{Deserialize, Serialize};

/// User name and password for one authentication domain.
///
/// Both parts are optional; absent values are sent as empty strings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	user: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	password: Option<String>,
}

impl Credentials {
	pub fn new(user: Option<impl Into<String>>, password: Option<impl Into<String>>) -> Self {
		Self {
			user: user.map(Into::into),
			password: password.map(Into::into),
		}
	}

	/// Credentials with both user and password present.
	pub fn with_user(user: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			user: Some(user.into()),
			password: Some(password.into()),
		}
	}

	/// User name, empty when absent.
	pub fn user(&self) -> &str {
		self.user.as_deref().unwrap_or_default()
	}

	/// Password, empty when absent.
	pub fn password(&self) -> &str {
		self.password.as_deref().unwrap_or_default()
	}
}

// Never print passwords.
impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials")
			.field("user", &self.user)
			.field("password", &self.password.as_ref().map(|_| "***"))
			.finish()
	}
}
