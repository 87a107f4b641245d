//! What happens to an infobase's database when the infobase is dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Drop mode passed to `DropInfoBase`.
///
/// The integer values are part of the call surface and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum DropMode {
	/// Unregister the infobase, leave the database untouched.
	KeepDatabase = 0,
	/// Unregister the infobase and delete its database.
	DeleteDatabase = 1,
	/// Unregister the infobase and clear the database contents.
	ClearDatabase = 2,
}

/// A drop mode that is not one of the three recognized values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid drop mode `{0}` (expected keep, delete or clear)")]
pub struct InvalidDropMode(pub String);

impl DropMode {
	/// Integer sent on the wire.
	pub fn code(self) -> i32 {
		self as i32
	}

	pub fn as_str(self) -> &'static str {
		match self {
			DropMode::KeepDatabase => "keep",
			DropMode::DeleteDatabase => "delete",
			DropMode::ClearDatabase => "clear",
		}
	}
}

impl From<DropMode> for i32 {
	fn from(mode: DropMode) -> Self {
		mode.code()
	}
}

impl TryFrom<i32> for DropMode {
	type Error = InvalidDropMode;

	fn try_from(code: i32) -> Result<Self, Self::Error> {
		match code {
			0 => Ok(DropMode::KeepDatabase),
			1 => Ok(DropMode::DeleteDatabase),
			2 => Ok(DropMode::ClearDatabase),
			other => Err(InvalidDropMode(other.to_string())),
		}
	}
}

impl FromStr for DropMode {
	type Err = InvalidDropMode;

	/// Accepts the wire codes, the short names, the long names and the
	/// legacy symbol names (`alive_db`, `destroy_db`, `clear_db`).
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
			"0" | "keep" | "keep-database" | "alive-db" => Ok(DropMode::KeepDatabase),
			"1" | "delete" | "delete-database" | "destroy-db" => Ok(DropMode::DeleteDatabase),
			"2" | "clear" | "clear-database" | "clear-database-contents" | "clear-db" => Ok(DropMode::ClearDatabase),
			_ => Err(InvalidDropMode(s.to_string())),
		}
	}
}

impl TryFrom<&str> for DropMode {
	type Error = InvalidDropMode;

	fn try_from(s: &str) -> Result<Self, Self::Error> {
		s.parse()
	}
}

impl fmt::Display for DropMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_codes_are_fixed() {
		assert_eq!(DropMode::KeepDatabase.code(), 0);
		assert_eq!(DropMode::DeleteDatabase.code(), 1);
		assert_eq!(DropMode::ClearDatabase.code(), 2);
	}

	#[test]
	fn parses_all_spellings() {
		assert_eq!("clear_db".parse::<DropMode>().unwrap(), DropMode::ClearDatabase);
		assert_eq!("Delete-Database".parse::<DropMode>().unwrap(), DropMode::DeleteDatabase);
		assert_eq!("keep".parse::<DropMode>().unwrap(), DropMode::KeepDatabase);
		assert_eq!(DropMode::try_from(" 2 ").unwrap(), DropMode::ClearDatabase);
	}

	#[test]
	fn rejects_unknown_modes() {
		assert_eq!("shred".parse::<DropMode>(), Err(InvalidDropMode("shred".to_string())));
		assert!(DropMode::try_from(3).is_err());
		assert!(DropMode::try_from(-1).is_err());
	}

	#[test]
	fn serializes_as_integer() {
		assert_eq!(serde_json::to_value(DropMode::ClearDatabase).unwrap(), serde_json::json!(2));
		let mode: DropMode = serde_json::from_value(serde_json::json!(1)).unwrap();
		assert_eq!(mode, DropMode::DeleteDatabase);
	}
}
