//! Structured output envelope for all CLI commands.
//!
//! ## Output Contract
//!
//! Every command produces a result envelope on stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "sessions",
//!   "data": [ ... ],
//!   "timings": { "durationMs": 412 }
//! }
//! ```
//!
//! On failure:
//!
//! ```json
//! {
//!   "ok": false,
//!   "command": "drop",
//!   "error": {
//!     "code": "NOT_FOUND",
//!     "message": "Infobase `Sales` not exists on `srv:1541`"
//!   }
//! }
//! ```


use std::io::{self, Write};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use ibadm::DropMode;
use serde::{Deserialize, Serialize};

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// JSON envelope (default)
	#[default]
	Json,
	/// Human-readable text
	Text,
}

/// The result envelope returned by all commands.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,

	pub ok: bool,

	/// Command name (e.g., "clusters", "lock", "drop")
	pub command: String,

	/// Command-specific result data (only present on success)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	/// Error information (only present on failure)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

/// Error information for failed commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	/// Human-readable error message
	pub message: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Invalid input provided
	InvalidInput,
	/// Profile file could not be read or parsed
	ConfigError,
	/// Endpoint did not answer a TCP probe
	Unreachable,
	/// Bridge refused or failed to open a runtime
	ConnectionFailed,
	/// Cluster, infobase or working process not found
	NotFound,
	/// Server side call failed
	RemoteError,
	/// Session/connection error
	SessionError,
	/// File I/O error
	IoError,
	/// Unknown/internal error
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::InvalidInput => write!(f, "INVALID_INPUT"),
			ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
			ErrorCode::Unreachable => write!(f, "UNREACHABLE"),
			ErrorCode::ConnectionFailed => write!(f, "CONNECTION_FAILED"),
			ErrorCode::NotFound => write!(f, "NOT_FOUND"),
			ErrorCode::RemoteError => write!(f, "REMOTE_ERROR"),
			ErrorCode::SessionError => write!(f, "SESSION_ERROR"),
			ErrorCode::IoError => write!(f, "IO_ERROR"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
		}
	}
}

/// Builder for constructing [`CommandResult`] instances.
pub struct ResultBuilder<T: Serialize> {
	schema_version: Option<u32>,
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Option<Instant>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			schema_version: Some(SCHEMA_VERSION),
			command: command.into(),
			data: None,
			error: None,
			start_time: Some(Instant::now()),
		}
	}

	/// Measure the duration from `start` instead of from builder creation.
	pub fn started_at(mut self, start: Instant) -> Self {
		self.start_time = Some(start);
		self
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn command_error(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();

		let timings = self.start_time.map(|start| Timings::from(start.elapsed()));

		CommandResult {
			schema_version: self.schema_version,
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings,
		}
	}
}

/// Print a command result to stdout in the specified format
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if result.ok {
		if let Some(ref data) = result.data {
			match serde_json::to_value(data) {
				Ok(serde_json::Value::Array(items)) => {
					for item in items {
						let _ = writeln!(stdout, "{}", text_line(&item));
					}
				}
				Ok(value) => {
					let _ = writeln!(stdout, "{}", text_line(&value));
				}
				Err(_) => {}
			}
		}
	} else if let Some(ref error) = result.error {
		let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
	}

	if let Some(ref timings) = result.timings {
		let _ = writeln!(stdout, "Completed in {}ms", timings.duration_ms);
	}
}

/// One `key=value` pair per field, keys sorted.
fn text_line(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::Object(fields) => fields
			.iter()
			.map(|(k, v)| match v {
				serde_json::Value::String(s) => format!("{k}={s}"),
				other => format!("{k}={other}"),
			})
			.collect::<Vec<_>>()
			.join(" "),
		serde_json::Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Print an error to stderr in human-readable format
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

// Command data types

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateData {
	pub infobase: String,
	pub terminated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockData {
	pub infobase: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<NaiveDateTime>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to: Option<NaiveDateTime>,
	pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockData {
	pub infobase: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsData {
	pub infobase: String,
	pub denied: bool,
	/// `ScheduledJobsDenied` before the lock, when known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prior: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropData {
	pub infobase: String,
	pub mode: String,
	/// Wire code sent with `DropInfoBase`.
	pub code: i32,
}

impl DropData {
	pub fn new(infobase: impl Into<String>, mode: DropMode) -> Self {
		Self {
			infobase: infobase.into(),
			mode: mode.as_str().to_string(),
			code: mode.code(),
		}
	}
}
