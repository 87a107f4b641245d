//! Typed adapters over the remote call surface.
//!
//! Each adapter wraps a [`Channel`] of one runtime flavor and exposes only
//! the calls this crate makes. Arguments go out as positional JSON arrays,
//! descriptors are passed back verbatim.

use ibadm_protocol::methods;
use ibadm_protocol::{
	ClusterInfo, ConnectionInfo, Credentials, DropMode, InfobaseInfo, InfobaseShort, SessionInfo,
	WorkingProcessInfo,
};
use ibadm_runtime::{Channel, Result};
use serde_json::Value;

/// Calls available on a server agent runtime.
#[derive(Clone)]
pub struct AgentApi {
	channel: Channel,
}

impl AgentApi {
	pub fn new(channel: Channel) -> Self {
		Self { channel }
	}

	pub async fn get_clusters(&self) -> Result<Vec<ClusterInfo>> {
		self.channel.send_no_args(methods::GET_CLUSTERS).await
	}

	/// Privileged listing; only succeeds for an authenticated agent administrator.
	pub async fn get_agent_admins(&self) -> Result<Vec<Value>> {
		self.channel.send_no_args(methods::GET_AGENT_ADMINS).await
	}

	pub async fn authenticate_agent(&self, credentials: &Credentials) -> Result<()> {
		self.channel
			.send_no_result(methods::AUTHENTICATE_AGENT, (credentials.user(), credentials.password()))
			.await
	}

	/// Authenticate a cluster administrator on this agent session.
	pub async fn authenticate(&self, cluster: &ClusterInfo, credentials: &Credentials) -> Result<()> {
		self.channel
			.send_no_result(methods::AUTHENTICATE, (cluster, credentials.user(), credentials.password()))
			.await
	}

	pub async fn get_infobases(&self, cluster: &ClusterInfo) -> Result<Vec<InfobaseShort>> {
		self.channel.send(methods::GET_CLUSTER_INFOBASES, (cluster,)).await
	}

	pub async fn get_infobase_sessions(
		&self,
		cluster: &ClusterInfo,
		infobase: &InfobaseShort,
	) -> Result<Vec<SessionInfo>> {
		self.channel.send(methods::GET_INFOBASE_SESSIONS, (cluster, infobase)).await
	}

	pub async fn get_working_processes(&self, cluster: &ClusterInfo) -> Result<Vec<WorkingProcessInfo>> {
		self.channel.send(methods::GET_WORKING_PROCESSES, (cluster,)).await
	}

	pub async fn terminate_session(&self, cluster: &ClusterInfo, session: &SessionInfo) -> Result<()> {
		self.channel.send_no_result(methods::TERMINATE_SESSION, (cluster, session)).await
	}
}

/// Calls available on a working process runtime.
#[derive(Clone)]
pub struct WorkingProcessApi {
	channel: Channel,
}

impl WorkingProcessApi {
	pub fn new(channel: Channel) -> Self {
		Self { channel }
	}

	/// Authenticate the cluster administrator.
	pub async fn authenticate_admin(&self, credentials: &Credentials) -> Result<()> {
		self.channel
			.send_no_result(methods::AUTHENTICATE_ADMIN, (credentials.user(), credentials.password()))
			.await
	}

	/// Register infobase administrator credentials for later infobase calls.
	pub async fn add_authentication(&self, credentials: &Credentials) -> Result<()> {
		self.channel
			.send_no_result(methods::ADD_AUTHENTICATION, (credentials.user(), credentials.password()))
			.await
	}

	/// Fresh infobase descriptor carrying only `name`.
	pub async fn create_infobase_info(&self, name: &str) -> Result<InfobaseInfo> {
		self.channel.send(methods::CREATE_INFOBASE_INFO, (name,)).await
	}

	pub async fn get_infobases(&self) -> Result<Vec<InfobaseInfo>> {
		self.channel.send_no_args(methods::GET_INFOBASES).await
	}

	pub async fn get_infobase_connections(&self, infobase: &InfobaseInfo) -> Result<Vec<ConnectionInfo>> {
		self.channel.send(methods::GET_INFOBASE_CONNECTIONS, (infobase,)).await
	}

	/// Push the whole descriptor back.
	pub async fn update_infobase(&self, infobase: &InfobaseInfo) -> Result<()> {
		self.channel.send_no_result(methods::UPDATE_INFOBASE, (infobase,)).await
	}

	pub async fn disconnect(&self, connection: &ConnectionInfo) -> Result<()> {
		self.channel.send_no_result(methods::DISCONNECT, (connection,)).await
	}

	pub async fn drop_infobase(&self, infobase: &InfobaseInfo, mode: DropMode) -> Result<()> {
		self.channel.send_no_result(methods::DROP_INFOBASE, (infobase, mode)).await
	}
}
