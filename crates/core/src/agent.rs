//! Server agent: the entry point for cluster discovery.

use std::sync::Arc;

use async_trait::async_trait;
use ibadm_protocol::{ClusterInfo, Credentials, InfobaseShort, SessionInfo, WorkingProcessInfo};
use ibadm_runtime::{
	AuthenticatableEndpoint, Endpoint, Launcher, PlatformRequirement, Result, Runtime, RuntimeFlavor,
};
use tracing::{debug, warn};

use crate::api::AgentApi;

/// Connection to a server agent.
///
/// ```ignore
/// let agent = Arc::new(Agent::new("srv:1540", Credentials::with_user("admin", ""), launcher)?);
/// agent.connect(&PlatformRequirement::new("~> 8.3")).await?;
/// let cluster = agent.cluster_find("srv", 1541).await?;
/// agent.disconnect().await;
/// ```
pub struct Agent {
	endpoint: Endpoint,
	runtime: Runtime,
}

impl Agent {
	pub const DEFAULT_PORT: u16 = 1540;

	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`](ibadm_runtime::Error::InvalidArgument) for a malformed address.
	pub fn new(host_port: &str, credentials: Credentials, launcher: Arc<dyn Launcher>) -> Result<Self> {
		Ok(Self::with_endpoint(
			Endpoint::parse(host_port, Self::DEFAULT_PORT, credentials)?,
			launcher,
		))
	}

	pub fn with_endpoint(endpoint: Endpoint, launcher: Arc<dyn Launcher>) -> Self {
		Self {
			endpoint,
			runtime: Runtime::new(RuntimeFlavor::Agent, launcher),
		}
	}

	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	pub fn host_port(&self) -> String {
		self.endpoint.host_port()
	}

	/// True if the agent port accepts TCP connections.
	pub async fn ping(&self) -> bool {
		self.endpoint.ping().await
	}

	/// Start the agent runtime and authenticate as agent administrator.
	pub async fn connect(&self, requirement: &PlatformRequirement) -> Result<()> {
		self.open(&self.endpoint.host_port(), requirement, self.endpoint.credentials())
			.await
	}

	pub async fn disconnect(&self) {
		AuthenticatableEndpoint::disconnect(self).await
	}

	pub fn is_connected(&self) -> bool {
		AuthenticatableEndpoint::is_connected(self)
	}

	/// Requirement the agent was connected with, `None` while disconnected.
	///
	/// Working process connections are opened with the same requirement.
	pub fn platform_requirement(&self) -> Option<PlatformRequirement> {
		if !self.is_connected() {
			return None;
		}
		self.runtime.requirement()
	}

	/// Launcher shared with the working process connections this agent hands out.
	pub fn launcher(&self) -> Arc<dyn Launcher> {
		Arc::clone(self.runtime.launcher())
	}

	fn api(&self) -> Result<AgentApi> {
		Ok(AgentApi::new(self.runtime.channel()?))
	}

	/// Reopen the runtime if the session looks stale.
	///
	/// # Errors
	///
	/// Returns [`Error::Unreachable`](ibadm_runtime::Error::Unreachable) when the agent port is
	/// closed, or whatever reopening the runtime fails with.
	async fn reconnect(&self) -> Result<()> {
		self.endpoint.ensure_reachable().await?;
		if !self.reconnect_required().await {
			return Ok(());
		}

		debug!(host_port = %self.endpoint, "agent session is stale, reconnecting");
		self.runtime.reopen().await
	}

	async fn reconnect_required(&self) -> bool {
		if !self.runtime.is_running() {
			return true;
		}

		match self.api() {
			Ok(api) => match api.get_clusters().await {
				// An agent without clusters is indistinguishable from a dead session.
				Ok(clusters) => clusters.is_empty(),
				Err(err) if err.is_disconnect() => true,
				Err(err) => {
					debug!(error = %err, "cluster listing failed, not reconnecting");
					false
				}
			},
			Err(_) => true,
		}
	}

	/// Clusters registered on the agent. Reconnects first if needed.
	pub async fn clusters(&self) -> Result<Vec<ClusterInfo>> {
		self.reconnect().await?;
		self.api()?.get_clusters().await
	}

	/// Find a cluster by host (case-insensitive) and main port.
	pub async fn cluster_find(&self, host: &str, port: u16) -> Result<Option<ClusterInfo>> {
		Ok(self
			.clusters()
			.await?
			.into_iter()
			.find(|cl| cl.host_name.eq_ignore_ascii_case(host) && cl.main_port == port))
	}

	pub async fn authenticate_cluster(&self, cluster: &ClusterInfo, credentials: &Credentials) -> Result<()> {
		debug!(cluster = %cluster.name, user = credentials.user(), "authenticating cluster administrator");
		self.api()?.authenticate(cluster, credentials).await
	}

	pub async fn cluster_infobases(&self, cluster: &ClusterInfo) -> Result<Vec<InfobaseShort>> {
		self.api()?.get_infobases(cluster).await
	}

	pub async fn infobase_sessions(
		&self,
		cluster: &ClusterInfo,
		infobase: &InfobaseShort,
	) -> Result<Vec<SessionInfo>> {
		self.api()?.get_infobase_sessions(cluster, infobase).await
	}

	pub async fn working_processes(&self, cluster: &ClusterInfo) -> Result<Vec<WorkingProcessInfo>> {
		self.api()?.get_working_processes(cluster).await
	}

	pub async fn terminate_session(&self, cluster: &ClusterInfo, session: &SessionInfo) -> Result<()> {
		self.api()?.terminate_session(cluster, session).await
	}
}

#[async_trait]
impl AuthenticatableEndpoint for Agent {
	type Credentials = Credentials;

	fn runtime(&self) -> &Runtime {
		&self.runtime
	}

	async fn is_authenticated(&self) -> bool {
		let Ok(api) = self.api() else {
			return false;
		};
		match api.get_agent_admins().await {
			Ok(_) => true,
			Err(err) => {
				debug!(error = %err, "agent admin listing refused");
				false
			}
		}
	}

	async fn authenticate(&self, credentials: &Credentials) -> Result<()> {
		self.api()?.authenticate_agent(credentials).await.inspect_err(|err| {
			warn!(host_port = %self.endpoint, user = credentials.user(), error = %err, "agent authentication failed");
		})
	}
}

impl std::fmt::Debug for Agent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Agent")
			.field("endpoint", &self.endpoint)
			.field("connected", &self.is_connected())
			.finish()
	}
}
