//! Read-only wrappers over listing results.
//!
//! A view remembers the cluster and agent that produced it so it can act
//! on itself later. Views are rebuilt on every listing and never cached.

use std::sync::Arc;

use ibadm_protocol::{ClusterInfo, SessionInfo, WorkingProcessInfo};
use ibadm_runtime::{Result, tcp_probe};
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::infobase::{InfobaseRef, LayeredCredentials};
use crate::wp_connection::WpConnection;

/// Client session of an infobase.
#[derive(Debug, Clone)]
pub struct Session {
	info: SessionInfo,
	cluster: ClusterInfo,
	agent: Arc<Agent>,
}

impl Session {
	pub(crate) fn new(info: SessionInfo, cluster: ClusterInfo, agent: Arc<Agent>) -> Self {
		Self { info, cluster, agent }
	}

	pub fn info(&self) -> &SessionInfo {
		&self.info
	}

	pub fn cluster(&self) -> &ClusterInfo {
		&self.cluster
	}

	/// Terminate the session.
	///
	/// A remote failure means the session is already gone and is not an
	/// error. Anything else (a dead runtime, a broken bridge) propagates.
	pub async fn terminate(&self) -> Result<()> {
		match self.agent.terminate_session(&self.cluster, &self.info).await {
			Ok(()) => {
				debug!(session = self.info.session_id, user = %self.info.user_name, "session terminated");
				Ok(())
			}
			Err(err) if err.is_remote() => {
				warn!(session = self.info.session_id, error = %err, "session termination refused, assuming it is gone");
				Ok(())
			}
			Err(err) => Err(err),
		}
	}
}

/// Working process of a cluster.
#[derive(Debug, Clone)]
pub struct WorkingProcess {
	info: WorkingProcessInfo,
	cluster: ClusterInfo,
	agent: Arc<Agent>,
}

impl WorkingProcess {
	pub(crate) fn new(info: WorkingProcessInfo, cluster: ClusterInfo, agent: Arc<Agent>) -> Self {
		Self { info, cluster, agent }
	}

	pub fn info(&self) -> &WorkingProcessInfo {
		&self.info
	}

	pub fn cluster(&self) -> &ClusterInfo {
		&self.cluster
	}

	pub fn host_port(&self) -> String {
		self.info.host_port()
	}

	pub fn is_running(&self) -> bool {
		self.info.is_running()
	}

	/// TCP probe on the process's own address.
	pub async fn ping(&self) -> bool {
		tcp_probe(&self.info.host_name, self.info.main_port, self.agent.endpoint().probe_timeout())
			.await
			.is_ok()
	}

	/// Open an authenticated connection to this process for `infobase`.
	pub async fn connect(&self, infobase: InfobaseRef, credentials: LayeredCredentials) -> Result<WpConnection> {
		let requirement = self.agent.platform_requirement().unwrap_or_default();
		let connection = WpConnection::new(self.info.clone(), infobase, credentials, self.agent.launcher())
			.with_probe_timeout(self.agent.endpoint().probe_timeout());
		connection.connect(&requirement).await?;
		Ok(connection)
	}
}
