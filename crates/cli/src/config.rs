//! Profile file and effective settings.
//!
//! The profile lives at `<config dir>/ibadm/config.json` unless `--config`
//! names another file. Every field is optional; command line flags and
//! `IBADM_*` variables override it field by field.
//!
//! ```json
//! {
//!   "bridgeUrl": "ws://127.0.0.1:1545/",
//!   "requirement": "~> 8.3",
//!   "agent": { "address": "srv", "user": "admin", "password": "secret" },
//!   "cluster": { "address": "srv:1541", "user": "cl-admin", "password": "cl-pw" },
//!   "infobases": {
//!     "Sales": { "user": "ib-admin", "password": "ib-pw", "unlockCode": "4242" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ibadm::{Agent, Credentials, DEFAULT_BRIDGE_URL, Endpoint, InfobaseRef, PlatformRequirement};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::{ConnectionArgs, InfobaseArgs};
use crate::error::{CliError, Result};

const DEFAULT_AGENT: &str = "localhost";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
	pub bridge_url: Option<String>,
	pub requirement: Option<String>,
	pub agent: EndpointProfile,
	pub cluster: EndpointProfile,
	/// Keyed by infobase name; lookups ignore case.
	pub infobases: BTreeMap<String, InfobaseProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointProfile {
	pub address: Option<String>,
	pub user: Option<String>,
	pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InfobaseProfile {
	pub user: Option<String>,
	pub password: Option<String>,
	pub unlock_code: Option<String>,
}

impl Profile {
	pub fn infobase(&self, name: &str) -> Option<&InfobaseProfile> {
		self.infobases
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, profile)| profile)
	}
}

/// `<config dir>/ibadm/config.json`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("ibadm").join("config.json"))
}

/// Load the profile at `path`, or the default profile file.
///
/// An explicit path must exist. A missing default file yields an empty profile.
pub fn load(path: Option<&Path>) -> Result<Profile> {
	let (path, explicit) = match path {
		Some(path) => (path.to_path_buf(), true),
		None => match default_path() {
			Some(path) => (path, false),
			None => return Ok(Profile::default()),
		},
	};

	if !explicit && !path.exists() {
		debug!(path = %path.display(), "no profile file, using defaults");
		return Ok(Profile::default());
	}

	read_profile(&path).map_err(CliError::Config)
}

fn read_profile(path: &Path) -> anyhow::Result<Profile> {
	let text = fs::read_to_string(path).with_context(|| format!("reading profile {}", path.display()))?;
	let profile =
		serde_json::from_str(&text).with_context(|| format!("parsing profile {}", path.display()))?;
	debug!(path = %path.display(), "profile loaded");
	Ok(profile)
}

fn credentials(user: Option<&String>, password: Option<&String>) -> Credentials {
	Credentials::new(user.cloned(), password.cloned())
}

/// Profile merged with command line overrides.
#[derive(Debug, Clone)]
pub struct Settings {
	pub bridge_url: String,
	pub requirement: PlatformRequirement,
	pub agent: String,
	pub agent_credentials: Credentials,
	pub cluster: String,
	pub cluster_credentials: Credentials,
	profile: Profile,
}

impl Settings {
	/// # Errors
	///
	/// Returns [`CliError::Admin`] with an invalid argument error for a malformed agent address.
	pub fn resolve(profile: Profile, args: &ConnectionArgs) -> Result<Self> {
		let agent = args
			.agent
			.clone()
			.or_else(|| profile.agent.address.clone())
			.unwrap_or_else(|| DEFAULT_AGENT.to_string());
		let agent_credentials = credentials(
			args.agent_user.as_ref().or(profile.agent.user.as_ref()),
			args.agent_password.as_ref().or(profile.agent.password.as_ref()),
		);

		// The cluster defaults to the agent's host on the cluster port.
		let cluster = match args.cluster.clone().or_else(|| profile.cluster.address.clone()) {
			Some(cluster) => cluster,
			None => Endpoint::parse(&agent, Agent::DEFAULT_PORT, Credentials::default())?
				.host()
				.to_string(),
		};
		let cluster_credentials = credentials(
			args.cluster_user.as_ref().or(profile.cluster.user.as_ref()),
			args.cluster_password.as_ref().or(profile.cluster.password.as_ref()),
		);

		Ok(Self {
			bridge_url: args
				.bridge_url
				.clone()
				.or_else(|| profile.bridge_url.clone())
				.unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string()),
			requirement: PlatformRequirement::new(
				args.requirement
					.clone()
					.or_else(|| profile.requirement.clone())
					.unwrap_or_default(),
			),
			agent,
			agent_credentials,
			cluster,
			cluster_credentials,
			profile,
		})
	}

	/// Infobase reference with flags layered over the profile entry.
	pub fn infobase(&self, args: &InfobaseArgs) -> InfobaseRef {
		let stored = self.profile.infobase(&args.name).cloned().unwrap_or_default();
		InfobaseRef::new(
			args.name.clone(),
			credentials(
				args.ib_user.as_ref().or(stored.user.as_ref()),
				args.ib_password.as_ref().or(stored.password.as_ref()),
			),
			args.unlock_code.clone().or(stored.unlock_code).unwrap_or_default(),
		)
	}
}
