use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// Profile file could not be read or parsed.
	#[error("{0:#}")]
	Config(#[source] anyhow::Error),

	#[error(transparent)]
	Admin(#[from] ibadm::Error),
}

/// Map an administration error onto an output code.
fn classify(err: &ibadm::Error) -> ErrorCode {
	use ibadm::Error;

	match err {
		Error::InvalidArgument(_) => ErrorCode::InvalidInput,
		Error::Unreachable { .. } => ErrorCode::Unreachable,
		Error::ConnectionFailed { .. } => ErrorCode::ConnectionFailed,
		Error::ClusterNotFound { .. } | Error::InfobaseNotFound { .. } | Error::NoAliveWorkingProcess(_) => {
			ErrorCode::NotFound
		}
		Error::Remote { .. } => ErrorCode::RemoteError,
		Error::NotConnected(_)
		| Error::NotAttached(_)
		| Error::TransportError(_)
		| Error::ProtocolError(_)
		| Error::ChannelClosed => ErrorCode::SessionError,
		Error::Io(_) => ErrorCode::IoError,
		Error::Json(_) => ErrorCode::InternalError,
	}
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Config(_) => (ErrorCode::ConfigError, None),
			CliError::Admin(err) => {
				let details = match err {
					ibadm::Error::Remote { name, .. } => Some(serde_json::json!({ "remote": name })),
					ibadm::Error::InfobaseNotFound { name, server } => {
						Some(serde_json::json!({ "infobase": name, "server": server }))
					}
					ibadm::Error::ClusterNotFound { cluster, server } => {
						Some(serde_json::json!({ "cluster": cluster, "server": server }))
					}
					_ => None,
				};
				(classify(err), details)
			}
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}
