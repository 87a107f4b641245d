//! Cluster registered on a server agent.

use std::sync::{Arc, Weak};

use ibadm_protocol::{ClusterInfo, Credentials, DropMode, InfobaseShort};
use ibadm_runtime::{Endpoint, Error, Result};
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::infobase::{InfobaseRef, LayeredCredentials};
use crate::views::{Session, WorkingProcess};
use crate::wp_connection::WpConnection;

/// Cluster handle.
///
/// A cluster must be [attached](Self::attach) to an [`Agent`] before it
/// can do anything. Attaching binds the agent once, resolves and caches
/// the cluster descriptor and authenticates the cluster administrator.
/// Every other operation goes through the bound agent's session.
pub struct Cluster {
	endpoint: Endpoint,
	agent: Option<Weak<Agent>>,
	info: Option<ClusterInfo>,
	wp_connection: Option<WpConnection>,
}

impl Cluster {
	pub const DEFAULT_PORT: u16 = 1541;

	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`] for a malformed address.
	pub fn new(host_port: &str, credentials: Credentials) -> Result<Self> {
		Ok(Self::with_endpoint(Endpoint::parse(host_port, Self::DEFAULT_PORT, credentials)?))
	}

	pub fn with_endpoint(endpoint: Endpoint) -> Self {
		Self {
			endpoint,
			agent: None,
			info: None,
			wp_connection: None,
		}
	}

	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	pub fn host_port(&self) -> String {
		self.endpoint.host_port()
	}

	/// True if the cluster port accepts TCP connections.
	pub async fn ping(&self) -> bool {
		self.endpoint.ping().await
	}

	/// Bind to `agent`, resolve the cluster descriptor and authenticate.
	///
	/// The first agent passed stays bound; later calls re-resolve and
	/// re-authenticate through it.
	///
	/// # Errors
	///
	/// Returns [`Error::NotAttached`] if the bound agent has been dropped;
	/// a cluster never moves to another agent.
	pub async fn attach(&mut self, agent: &Arc<Agent>) -> Result<()> {
		match &self.agent {
			Some(bound) => match bound.upgrade() {
				Some(bound) if !Arc::ptr_eq(&bound, agent) => {
					warn!(cluster = %self.endpoint, agent = %bound.endpoint(), "cluster already attached, keeping the first agent");
				}
				Some(_) => {}
				None => return Err(Error::NotAttached(self.host_port())),
			},
			None => self.agent = Some(Arc::downgrade(agent)),
		}

		let agent = self.agent()?;
		self.info = agent.cluster_find(self.endpoint.host(), self.endpoint.port()).await?;
		let info = self.info()?;
		debug!(cluster = %self.endpoint, name = %info.name, "cluster resolved");

		agent.authenticate_cluster(info, self.endpoint.credentials()).await
	}

	/// True once attached and the descriptor was found.
	pub fn is_attached(&self) -> bool {
		self.agent.as_ref().is_some_and(|a| a.strong_count() > 0) && self.info.is_some()
	}

	/// Agent this cluster is attached to.
	///
	/// # Errors
	///
	/// Returns [`Error::NotAttached`] if [`attach`](Self::attach) was never called
	/// or the agent has since been dropped.
	pub fn agent(&self) -> Result<Arc<Agent>> {
		self.agent
			.as_ref()
			.and_then(Weak::upgrade)
			.ok_or_else(|| Error::NotAttached(self.host_port()))
	}

	/// Cached cluster descriptor.
	///
	/// # Errors
	///
	/// Returns [`Error::NotAttached`] before [`attach`](Self::attach), and
	/// [`Error::ClusterNotFound`] if the agent does not know this cluster.
	pub fn info(&self) -> Result<&ClusterInfo> {
		let agent = self.agent()?;
		self.info.as_ref().ok_or_else(|| Error::ClusterNotFound {
			cluster: self.host_port(),
			server: agent.host_port(),
		})
	}

	/// Infobases registered in the cluster.
	pub async fn infobases(&self) -> Result<Vec<InfobaseShort>> {
		let agent = self.agent()?;
		agent.cluster_infobases(self.info()?).await
	}

	/// Case-insensitive lookup by name. Not cached.
	pub async fn infobase_find(&self, name: &str) -> Result<Option<InfobaseShort>> {
		Ok(self
			.infobases()
			.await?
			.into_iter()
			.find(|ib| ib.name.eq_ignore_ascii_case(name)))
	}

	pub async fn infobase_include(&self, name: &str) -> Result<bool> {
		Ok(self.infobase_find(name).await?.is_some())
	}

	/// Sessions of an infobase, `None` if the infobase is not registered.
	pub async fn infobase_sessions(&self, name: &str) -> Result<Option<Vec<Session>>> {
		let Some(infobase) = self.infobase_find(name).await? else {
			return Ok(None);
		};

		let agent = self.agent()?;
		let info = self.info()?;
		let sessions = agent.infobase_sessions(info, &infobase).await?;
		Ok(Some(
			sessions
				.into_iter()
				.map(|s| Session::new(s, info.clone(), Arc::clone(&agent)))
				.collect(),
		))
	}

	/// Terminate every session of an infobase, returning how many there were.
	///
	/// # Errors
	///
	/// Returns [`Error::InfobaseNotFound`] if the infobase is not registered.
	pub async fn terminate_sessions(&self, name: &str) -> Result<usize> {
		let sessions = self
			.infobase_sessions(name)
			.await?
			.ok_or_else(|| Error::InfobaseNotFound {
				name: name.to_string(),
				server: self.host_port(),
			})?;

		for session in &sessions {
			session.terminate().await?;
		}
		Ok(sessions.len())
	}

	/// All working processes of the cluster.
	pub async fn wprocesses(&self) -> Result<Vec<WorkingProcess>> {
		let agent = self.agent()?;
		let info = self.info()?;
		let processes = agent.working_processes(info).await?;
		Ok(processes
			.into_iter()
			.map(|wp| WorkingProcess::new(wp, info.clone(), Arc::clone(&agent)))
			.collect())
	}

	/// First working process that is running and answers a TCP probe.
	pub async fn alive_wprocess(&self) -> Result<WorkingProcess> {
		for wp in self.wprocesses().await? {
			if !wp.is_running() {
				continue;
			}
			if wp.ping().await {
				return Ok(wp);
			}
			debug!(host_port = %wp.host_port(), "working process is running but not reachable");
		}
		Err(Error::NoAliveWorkingProcess(self.host_port()))
	}

	fn layered_credentials(&self, infobase: &InfobaseRef) -> LayeredCredentials {
		LayeredCredentials::new(self.endpoint.credentials().clone(), infobase.credentials().clone())
	}

	/// Connection to a live working process for `infobase`.
	///
	/// The cached connection is reused while it serves the same infobase
	/// and its process still answers a TCP probe; otherwise it is closed
	/// and a new one is opened on the first alive process.
	pub async fn wp_connection(&mut self, infobase: &InfobaseRef) -> Result<&mut WpConnection> {
		let mut cached = self.wp_connection.take();
		if let Some(conn) = &cached {
			if !conn.infobase().is_named(infobase.name()) || !conn.ping().await {
				debug!(host_port = %conn.host_port(), "dropping cached working process connection");
				conn.disconnect().await;
				cached = None;
			}
		}

		let connection = match cached {
			Some(conn) => conn,
			None => {
				self.alive_wprocess()
					.await?
					.connect(infobase.clone(), self.layered_credentials(infobase))
					.await?
			}
		};
		Ok(self.wp_connection.insert(connection))
	}

	/// Drop `infobase` through a live working process.
	///
	/// See [`WpConnection::drop_infobase_with`] for the step order and failure behavior.
	pub async fn drop_infobase<M>(&mut self, infobase: &InfobaseRef, mode: M) -> Result<()>
	where
		M: TryInto<DropMode>,
		Error: From<M::Error>,
	{
		let mode = mode.try_into()?;
		self.wp_connection(infobase).await?.drop_infobase_with(mode).await
	}

	/// Close the cached working process connection, if any.
	pub async fn disconnect(&mut self) {
		if let Some(connection) = self.wp_connection.take() {
			connection.disconnect().await;
		}
	}
}

impl std::fmt::Debug for Cluster {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Cluster")
			.field("endpoint", &self.endpoint)
			.field("info", &self.info)
			.field("attached", &self.is_attached())
			.finish()
	}
}
