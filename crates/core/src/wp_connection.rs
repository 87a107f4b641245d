//! Connection to one working process on behalf of one infobase.
//!
//! Every lock, unlock and drop operation fetches the live infobase
//! descriptor first ([`WpConnection::infobase_info`]), which re-checks that
//! the infobase exists and re-authenticates the infobase administrator.
//! The descriptor is changed locally and pushed back whole.
//!
//! Dropping an infobase runs four steps in a fixed order:
//!
//! 1. lock sessions with [`DROP_PERMISSION_CODE`]
//! 2. lock scheduled jobs
//! 3. disconnect every client connection
//! 4. `DropInfoBase`
//!
//! A failure stops the sequence where it happened. Nothing is rolled
//! back, so a failed drop leaves the infobase locked.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use ibadm_protocol::{ConnectionInfo, Credentials, DropMode, InfobaseInfo, WorkingProcessInfo};
use ibadm_protocol::{denial_anchor, denial_horizon};
use ibadm_runtime::{
	AuthenticatableEndpoint, DEFAULT_PROBE_TIMEOUT, Error, Launcher, PlatformRequirement, Result, Runtime,
	RuntimeFlavor, tcp_probe,
};
use tracing::{debug, info};

use crate::api::WorkingProcessApi;
use crate::infobase::{InfobaseRef, LayeredCredentials};

/// Permission code the drop sequence locks sessions with.
pub const DROP_PERMISSION_CODE: &str = "BEFORE DROP INFOBASE";

pub struct WpConnection {
	process: WorkingProcessInfo,
	infobase: InfobaseRef,
	credentials: LayeredCredentials,
	runtime: Runtime,
	probe_timeout: Duration,
	/// `ScheduledJobsDenied` seen by the last [`lock_schjobs`](Self::lock_schjobs).
	schjobs_prior: Option<bool>,
}

impl WpConnection {
	pub fn new(
		process: WorkingProcessInfo,
		infobase: InfobaseRef,
		credentials: LayeredCredentials,
		launcher: Arc<dyn Launcher>,
	) -> Self {
		Self {
			process,
			infobase,
			credentials,
			runtime: Runtime::new(RuntimeFlavor::WorkingProcess, launcher),
			probe_timeout: DEFAULT_PROBE_TIMEOUT,
			schjobs_prior: None,
		}
	}

	pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
		self.probe_timeout = timeout;
		self
	}

	pub fn process(&self) -> &WorkingProcessInfo {
		&self.process
	}

	pub fn infobase(&self) -> &InfobaseRef {
		&self.infobase
	}

	pub fn host_port(&self) -> String {
		self.process.host_port()
	}

	/// Open the runtime and authenticate both layers.
	pub async fn connect(&self, requirement: &PlatformRequirement) -> Result<()> {
		self.open(&self.host_port(), requirement, &self.credentials).await
	}

	pub async fn disconnect(&self) {
		AuthenticatableEndpoint::disconnect(self).await
	}

	pub fn is_connected(&self) -> bool {
		AuthenticatableEndpoint::is_connected(self)
	}

	/// True if the working process port accepts TCP connections.
	pub async fn ping(&self) -> bool {
		tcp_probe(&self.process.host_name, self.process.main_port, self.probe_timeout)
			.await
			.is_ok()
	}

	fn api(&self) -> Result<WorkingProcessApi> {
		Ok(WorkingProcessApi::new(self.runtime.channel()?))
	}

	/// Register infobase administrator credentials and prove they work.
	pub async fn authenticate_infobase_admin(&self, credentials: &Credentials) -> Result<()> {
		let api = self.api()?;
		api.add_authentication(credentials).await?;
		let probe = api.create_infobase_info(self.infobase.name()).await?;
		api.get_infobase_connections(&probe).await?;
		Ok(())
	}

	/// Infobases served by the working process.
	pub async fn infobases(&self) -> Result<Vec<InfobaseInfo>> {
		self.api()?.get_infobases().await
	}

	/// Case-insensitive lookup by name.
	pub async fn infobase_find(&self, name: &str) -> Result<Option<InfobaseInfo>> {
		Ok(self
			.infobases()
			.await?
			.into_iter()
			.find(|ib| ib.name.eq_ignore_ascii_case(name)))
	}

	pub async fn infobase_exists(&self) -> Result<bool> {
		Ok(self.infobase_find(self.infobase.name()).await?.is_some())
	}

	fn not_found(&self) -> Error {
		Error::InfobaseNotFound {
			name: self.infobase.name().to_string(),
			server: self.host_port(),
		}
	}

	/// Live descriptor of the bound infobase.
	///
	/// # Errors
	///
	/// Returns [`Error::InfobaseNotFound`] if the infobase is not served by this process.
	pub async fn infobase_info(&self) -> Result<InfobaseInfo> {
		if !self.infobase_exists().await? {
			return Err(self.not_found());
		}
		self.authenticate_infobase_admin(&self.credentials.infobase).await?;
		self.infobase_find(self.infobase.name())
			.await?
			.ok_or_else(|| self.not_found())
	}

	/// Client connections to the bound infobase.
	pub async fn connections(&self) -> Result<Vec<ConnectionInfo>> {
		let info = self.infobase_info().await?;
		self.api()?.get_infobase_connections(&info).await
	}

	/// Disconnect every client connection, returning how many were dropped.
	pub async fn drop_connections(&self) -> Result<usize> {
		let connections = self.connections().await?;
		let api = self.api()?;
		for conn in &connections {
			debug!(conn_id = conn.conn_id, app = %conn.app_id, host = %conn.host, "disconnecting client");
			api.disconnect(conn).await?;
		}
		Ok(connections.len())
	}

	/// True if sessions are denied under a code other than the infobase's own unlock code.
	pub async fn is_locked(&self) -> Result<bool> {
		let info = self.infobase_info().await?;
		Ok(info.sessions_denied && info.permission_code != self.infobase.unlock_code())
	}

	/// Deny new sessions under the infobase's unlock code.
	///
	/// `from` and `to` default to an open-ended window.
	pub async fn lock_sessions(
		&self,
		from: Option<NaiveDateTime>,
		to: Option<NaiveDateTime>,
		message: &str,
	) -> Result<()> {
		self.lock_sessions_with_code(from, to, self.infobase.unlock_code(), message)
			.await
	}

	/// Deny new sessions under `code`.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidArgument`] for an empty code, before anything is sent.
	pub async fn lock_sessions_with_code(
		&self,
		from: Option<NaiveDateTime>,
		to: Option<NaiveDateTime>,
		code: &str,
		message: &str,
	) -> Result<()> {
		if code.is_empty() {
			return Err(Error::invalid_argument("Permission code won't be empty"));
		}

		let mut info = self.infobase_info().await?;
		info.denied_from = from.unwrap_or_else(denial_anchor);
		info.denied_to = to.unwrap_or_else(denial_horizon);
		info.denied_message = message.to_string();
		info.sessions_denied = true;
		info.permission_code = code.to_string();
		self.api()?.update_infobase(&info).await?;

		info!(infobase = %info.name, from = %info.denied_from, to = %info.denied_to, "sessions locked");
		Ok(())
	}

	/// Allow sessions again and clear the lock window, message and code.
	pub async fn unlock_sessions(&self) -> Result<()> {
		let mut info = self.infobase_info().await?;
		info.denied_from = denial_anchor();
		info.denied_to = denial_anchor();
		info.denied_message = String::new();
		info.sessions_denied = false;
		info.permission_code = String::new();
		self.api()?.update_infobase(&info).await?;

		info!(infobase = %info.name, "sessions unlocked");
		Ok(())
	}

	/// Deny scheduled jobs, returning the previous `ScheduledJobsDenied` value.
	pub async fn lock_schjobs(&mut self) -> Result<bool> {
		let mut info = self.infobase_info().await?;
		let prior = info.scheduled_jobs_denied;
		self.schjobs_prior = Some(prior);
		info.scheduled_jobs_denied = true;
		self.api()?.update_infobase(&info).await?;

		info!(infobase = %info.name, prior, "scheduled jobs locked");
		Ok(prior)
	}

	/// Restore the `ScheduledJobsDenied` value saved by [`lock_schjobs`](Self::lock_schjobs).
	///
	/// Without a saved value scheduled jobs stay denied.
	pub async fn unlock_schjobs(&mut self) -> Result<()> {
		self.set_schjobs_denied(self.schjobs_prior.unwrap_or(true)).await
	}

	/// Set `ScheduledJobsDenied` outright, ignoring any saved value.
	pub async fn set_schjobs_denied(&self, denied: bool) -> Result<()> {
		let mut info = self.infobase_info().await?;
		info.scheduled_jobs_denied = denied;
		self.api()?.update_infobase(&info).await?;

		info!(infobase = %info.name, denied, "scheduled jobs updated");
		Ok(())
	}

	/// Drop the bound infobase.
	///
	/// `mode` may be a [`DropMode`], its wire code or one of its names; an
	/// unrecognized mode fails with [`Error::InvalidArgument`] before
	/// anything is sent.
	pub async fn drop_infobase<M>(&mut self, mode: M) -> Result<()>
	where
		M: TryInto<DropMode>,
		Error: From<M::Error>,
	{
		self.drop_infobase_with(mode.try_into()?).await
	}

	/// Drop the bound infobase with an already parsed `mode`.
	///
	/// Steps run in order: deny sessions under [`DROP_PERMISSION_CODE`], deny
	/// scheduled jobs, disconnect every client connection, then drop. A failed
	/// step stops the sequence and nothing done before it is undone.
	pub async fn drop_infobase_with(&mut self, mode: DropMode) -> Result<()> {
		debug!(infobase = %self.infobase.name(), %mode, host_port = %self.host_port(), "dropping infobase");

		self.lock_sessions_with_code(None, None, DROP_PERMISSION_CODE, "").await?;
		self.lock_schjobs().await?;
		let dropped = self.drop_connections().await?;

		let info = self.infobase_info().await?;
		self.api()?.drop_infobase(&info, mode).await?;

		info!(infobase = %info.name, %mode, dropped_connections = dropped, "infobase dropped");
		Ok(())
	}
}

#[async_trait]
impl AuthenticatableEndpoint for WpConnection {
	type Credentials = LayeredCredentials;

	fn runtime(&self) -> &Runtime {
		&self.runtime
	}

	async fn is_authenticated(&self) -> bool {
		false
	}

	async fn authenticate(&self, credentials: &LayeredCredentials) -> Result<()> {
		self.api()?.authenticate_admin(&credentials.cluster).await?;
		self.authenticate_infobase_admin(&credentials.infobase).await
	}
}

impl std::fmt::Debug for WpConnection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WpConnection")
			.field("host_port", &self.host_port())
			.field("infobase", &self.infobase.name())
			.field("connected", &self.is_connected())
			.finish()
	}
}
