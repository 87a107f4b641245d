use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;


#[derive(Parser, Debug)]
#[command(name = "ibadm")]
#[command(about = "Administer infobases of a clustered application server")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Profile file (defaults to <config dir>/ibadm/config.json)
	#[arg(long, global = true, value_name = "FILE", env = "IBADM_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(flatten)]
	pub connection: ConnectionArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Endpoint overrides; each one wins over the matching profile field.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
	/// Automation bridge WebSocket URL
	#[arg(long, global = true, value_name = "URL", env = "IBADM_BRIDGE_URL")]
	pub bridge_url: Option<String>,

	/// Platform version the bridge must open runtimes for
	#[arg(long, global = true, value_name = "REQ", env = "IBADM_REQUIREMENT")]
	pub requirement: Option<String>,

	/// Server agent address (host[:port], port defaults to 1540)
	#[arg(long, global = true, value_name = "HOST[:PORT]", env = "IBADM_AGENT")]
	pub agent: Option<String>,

	#[arg(long, global = true, value_name = "USER", env = "IBADM_AGENT_USER")]
	pub agent_user: Option<String>,

	#[arg(long, global = true, value_name = "PASSWORD", env = "IBADM_AGENT_PASSWORD", hide_env_values = true)]
	pub agent_password: Option<String>,

	/// Cluster address (host[:port], port defaults to 1541)
	#[arg(long, global = true, value_name = "HOST[:PORT]", env = "IBADM_CLUSTER")]
	pub cluster: Option<String>,

	#[arg(long, global = true, value_name = "USER", env = "IBADM_CLUSTER_USER")]
	pub cluster_user: Option<String>,

	#[arg(long, global = true, value_name = "PASSWORD", env = "IBADM_CLUSTER_PASSWORD", hide_env_values = true)]
	pub cluster_password: Option<String>,
}

/// Target infobase and its administrator credentials.
#[derive(Args, Debug, Clone)]
pub struct InfobaseArgs {
	/// Infobase name (case-insensitive)
	pub name: String,

	#[arg(long, value_name = "USER", env = "IBADM_IB_USER")]
	pub ib_user: Option<String>,

	#[arg(long, value_name = "PASSWORD", env = "IBADM_IB_PASSWORD", hide_env_values = true)]
	pub ib_password: Option<String>,

	/// Permission code that lets holders in while sessions are locked
	#[arg(long, value_name = "CODE", env = "IBADM_UNLOCK_CODE", hide_env_values = true)]
	pub unlock_code: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// List clusters registered on the server agent
	Clusters,

	/// List infobases registered in the cluster
	#[command(alias = "ls")]
	Infobases,

	/// List sessions of an infobase
	Sessions {
		#[command(flatten)]
		infobase: InfobaseArgs,
	},

	/// Terminate every session of an infobase
	Terminate {
		#[command(flatten)]
		infobase: InfobaseArgs,
	},

	/// Deny new sessions under the infobase's unlock code
	Lock {
		#[command(flatten)]
		infobase: InfobaseArgs,
		/// Start of the denial window (defaults to open-ended)
		#[arg(long, value_name = "DATETIME", value_parser = parse_datetime)]
		from: Option<NaiveDateTime>,
		/// End of the denial window (defaults to open-ended)
		#[arg(long, value_name = "DATETIME", value_parser = parse_datetime)]
		to: Option<NaiveDateTime>,
		/// Message shown to users who are denied
		#[arg(short, long, default_value = "")]
		message: String,
	},

	/// Allow sessions again
	Unlock {
		#[command(flatten)]
		infobase: InfobaseArgs,
	},

	/// Deny scheduled jobs
	LockJobs {
		#[command(flatten)]
		infobase: InfobaseArgs,
	},

	/// Allow scheduled jobs
	UnlockJobs {
		#[command(flatten)]
		infobase: InfobaseArgs,
	},

	/// Drop an infobase: lock, disconnect everyone, then unregister
	Drop {
		#[command(flatten)]
		infobase: InfobaseArgs,
		/// keep (database untouched), delete (database removed) or clear (contents cleared)
		#[arg(long, value_name = "MODE")]
		mode: String,
	},
}

impl Commands {
	/// Name used in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Clusters => "clusters",
			Commands::Infobases => "infobases",
			Commands::Sessions { .. } => "sessions",
			Commands::Terminate { .. } => "terminate",
			Commands::Lock { .. } => "lock",
			Commands::Unlock { .. } => "unlock",
			Commands::LockJobs { .. } => "lock-jobs",
			Commands::UnlockJobs { .. } => "unlock-jobs",
			Commands::Drop { .. } => "drop",
		}
	}

	/// True for commands that only need the agent, not an attached cluster.
	pub fn agent_only(&self) -> bool {
		matches!(self, Commands::Clusters)
	}
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and the `T`-separated forms.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
	const FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

	let s = s.trim();
	for format in FORMATS {
		if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
			return Ok(dt);
		}
	}
	chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
		.ok()
		.and_then(|d| d.and_hms_opt(0, 0, 0))
		.ok_or_else(|| format!("invalid date/time `{s}` (expected YYYY-MM-DD[ HH:MM[:SS]])"))
}
