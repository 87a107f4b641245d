//! Command execution.
//!
//! One invocation opens one agent session. Cluster commands attach the
//! configured cluster to it; infobase commands then go through the
//! cluster's working process connection. Everything opened is closed
//! before the result is returned, whether the command failed or not.

use std::sync::Arc;
use std::time::Instant;

use ibadm::{Agent, BridgeLauncher, Cluster, DropMode, Launcher};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, InfobaseArgs};
use crate::config::{self, Settings};
use crate::error::Result;
use crate::output::{self, DropData, JobsData, LockData, OutputFormat, ResultBuilder, TerminateData, UnlockData};

/// Resolve settings, run the command against the bridge and print the result.
pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let start = Instant::now();
	let profile = config::load(cli.config.as_deref())?;
	let settings = Settings::resolve(profile, &cli.connection)?;
	debug!(bridge = %settings.bridge_url, agent = %settings.agent, cluster = %settings.cluster, "settings resolved");

	let launcher: Arc<dyn Launcher> = Arc::new(BridgeLauncher::new(settings.bridge_url.clone()));
	let data = execute(&cli.command, &settings, launcher).await?;

	let result = ResultBuilder::new(cli.command.name()).started_at(start).data(data).build();
	output::print_result(&result, format);
	Ok(())
}

fn json<T: Serialize>(data: T) -> Result<Value> {
	Ok(serde_json::to_value(data).map_err(ibadm::Error::from)?)
}

/// Run one command and return its result data.
///
/// # Errors
///
/// Arguments are validated before any endpoint is contacted; an unreachable
/// agent fails before the bridge is asked to open anything.
pub async fn execute(command: &Commands, settings: &Settings, launcher: Arc<dyn Launcher>) -> Result<Value> {
	if let Commands::Drop { mode, .. } = command {
		mode.parse::<DropMode>().map_err(ibadm::Error::from)?;
	}

	let agent = Arc::new(Agent::new(&settings.agent, settings.agent_credentials.clone(), launcher)?);
	agent.endpoint().ensure_reachable().await?;
	agent.connect(&settings.requirement).await?;

	let result = if command.agent_only() {
		run_on_agent(command, &agent).await
	} else {
		run_on_cluster(command, settings, &agent).await
	};

	agent.disconnect().await;
	result
}

async fn run_on_agent(command: &Commands, agent: &Agent) -> Result<Value> {
	info!(command = command.name(), agent = %agent.endpoint(), "running command");
	json(agent.clusters().await?)
}

async fn run_on_cluster(command: &Commands, settings: &Settings, agent: &Arc<Agent>) -> Result<Value> {
	let mut cluster = Cluster::new(&settings.cluster, settings.cluster_credentials.clone())?;
	cluster.attach(agent).await?;
	info!(command = command.name(), cluster = %cluster.endpoint(), "running command");

	let result = run(command, settings, &mut cluster).await;
	cluster.disconnect().await;
	result
}

async fn run(command: &Commands, settings: &Settings, cluster: &mut Cluster) -> Result<Value> {
	match command {
		Commands::Clusters => json(cluster.agent()?.clusters().await?),
		Commands::Infobases => json(cluster.infobases().await?),
		Commands::Sessions { infobase } => {
			let sessions = cluster
				.infobase_sessions(&infobase.name)
				.await?
				.ok_or_else(|| not_found(cluster, infobase))?;
			json(sessions.iter().map(|s| s.info()).collect::<Vec<_>>())
		}
		Commands::Terminate { infobase } => json(TerminateData {
			infobase: infobase.name.clone(),
			terminated: cluster.terminate_sessions(&infobase.name).await?,
		}),
		Commands::Lock {
			infobase,
			from,
			to,
			message,
		} => {
			let target = settings.infobase(infobase);
			cluster.wp_connection(&target).await?.lock_sessions(*from, *to, message).await?;
			json(LockData {
				infobase: infobase.name.clone(),
				from: *from,
				to: *to,
				message: message.clone(),
			})
		}
		Commands::Unlock { infobase } => {
			let target = settings.infobase(infobase);
			cluster.wp_connection(&target).await?.unlock_sessions().await?;
			json(UnlockData {
				infobase: infobase.name.clone(),
			})
		}
		Commands::LockJobs { infobase } => {
			let target = settings.infobase(infobase);
			let prior = cluster.wp_connection(&target).await?.lock_schjobs().await?;
			json(JobsData {
				infobase: infobase.name.clone(),
				denied: true,
				prior: Some(prior),
			})
		}
		// A fresh process has no saved prior state, so allow jobs outright.
		Commands::UnlockJobs { infobase } => {
			let target = settings.infobase(infobase);
			cluster.wp_connection(&target).await?.set_schjobs_denied(false).await?;
			json(JobsData {
				infobase: infobase.name.clone(),
				denied: false,
				prior: None,
			})
		}
		Commands::Drop { infobase, mode } => {
			let mode: DropMode = mode.parse().map_err(ibadm::Error::from)?;
			let target = settings.infobase(infobase);
			cluster.drop_infobase(&target, mode).await?;
			json(DropData::new(infobase.name.clone(), mode))
		}
	}
}

fn not_found(cluster: &Cluster, infobase: &InfobaseArgs) -> ibadm::Error {
	ibadm::Error::InfobaseNotFound {
		name: infobase.name.clone(),
		server: cluster.host_port(),
	}
}
