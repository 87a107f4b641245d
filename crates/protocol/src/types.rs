//! Remote object descriptors.
//!
//! Each descriptor mirrors one object kind of the administration call
//! surface. Descriptors are returned by listing calls and passed back
//! verbatim (handle included) as arguments of later calls.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Opaque reference to a remote object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Cluster registered on a server agent (`IClusterInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterInfo {
	pub handle: Handle,
	pub host_name: String,
	pub main_port: u16,
	#[serde(default)]
	pub name: String,
}

/// Infobase as listed by a cluster (`IInfoBaseShort`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InfobaseShort {
	pub handle: Handle,
	pub name: String,
	#[serde(default)]
	pub descr: String,
}

/// Client session of an infobase (`ISessionInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionInfo {
	pub handle: Handle,
	pub session_id: u32,
	#[serde(default)]
	pub app_id: String,
	#[serde(default)]
	pub user_name: String,
	#[serde(default)]
	pub host: String,
}

/// Working process of a cluster (`IWorkingProcessInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkingProcessInfo {
	pub handle: Handle,
	pub host_name: String,
	pub main_port: u16,
	/// `1` while the process is running.
	pub running: i32,
	#[serde(default)]
	pub pid: String,
}

impl WorkingProcessInfo {
	pub fn is_running(&self) -> bool {
		self.running == 1
	}

	pub fn host_port(&self) -> String {
		format!("{}:{}", self.host_name, self.main_port)
	}
}

/// Client connection to an infobase served by a working process (`IInfoBaseConnectionInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionInfo {
	pub handle: Handle,
	pub conn_id: u32,
	#[serde(default)]
	pub app_id: String,
	#[serde(default)]
	pub host: String,
}

/// Full infobase descriptor as seen by a working process (`IInfoBaseInfo`).
///
/// The lock fields are mutable remote properties: fetch the descriptor,
/// change it locally, push the whole record back with `UpdateInfoBase`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InfobaseInfo {
	pub handle: Handle,
	pub name: String,
	#[serde(default = "denial_anchor")]
	pub denied_from: NaiveDateTime,
	#[serde(default = "denial_anchor")]
	pub denied_to: NaiveDateTime,
	#[serde(default)]
	pub denied_message: String,
	#[serde(default)]
	pub permission_code: String,
	#[serde(default)]
	pub sessions_denied: bool,
	#[serde(default)]
	pub scheduled_jobs_denied: bool,
}

/// Start of the open-ended denial window, also used for a collapsed window.
pub fn denial_anchor() -> NaiveDateTime {
	date(1973, 9, 7)
}

/// End of the open-ended denial window.
pub fn denial_horizon() -> NaiveDateTime {
	date(2073, 9, 7)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
	NaiveDate::from_ymd_opt(year, month, day)
		.and_then(|d| d.and_hms_opt(0, 0, 0))
		.unwrap_or_default()
}
