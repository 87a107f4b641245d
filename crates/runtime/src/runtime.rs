//! Lazily created, stoppable runtime session bound to one endpoint.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::remote::{Launcher, PlatformRequirement, RemoteCall, RuntimeFlavor};

/// Address and requirement of the last successful start.
#[derive(Clone)]
struct Target {
	host_port: String,
	requirement: PlatformRequirement,
}

#[derive(Default)]
struct State {
	target: Option<Target>,
	remote: Option<Arc<dyn RemoteCall>>,
}

/// Runtime handle owned by an endpoint object.
///
/// Holds at most one open session. The session is created by
/// [`start`](Self::start), torn down by [`stop`](Self::stop) and replaced
/// by [`reopen`](Self::reopen). The address and requirement of the last
/// start survive a stop, so a stopped runtime can be reopened.
pub struct Runtime {
	flavor: RuntimeFlavor,
	launcher: Arc<dyn Launcher>,
	state: Mutex<State>,
}

impl Runtime {
	pub fn new(flavor: RuntimeFlavor, launcher: Arc<dyn Launcher>) -> Self {
		Self {
			flavor,
			launcher,
			state: Mutex::new(State::default()),
		}
	}

	pub fn flavor(&self) -> RuntimeFlavor {
		self.flavor
	}

	pub fn launcher(&self) -> &Arc<dyn Launcher> {
		&self.launcher
	}

	/// True while a session is open.
	pub fn is_running(&self) -> bool {
		self.state.lock().remote.as_ref().is_some_and(|r| r.is_open())
	}

	/// Requirement of the last successful start.
	pub fn requirement(&self) -> Option<PlatformRequirement> {
		self.state.lock().target.as_ref().map(|t| t.requirement.clone())
	}

	/// Start a session unless one is already running.
	pub async fn start(&self, host_port: &str, requirement: &PlatformRequirement) -> Result<()> {
		if self.is_running() {
			return Ok(());
		}

		tracing::debug!(flavor = %self.flavor, %host_port, %requirement, "starting runtime");
		let target = Target {
			host_port: host_port.to_string(),
			requirement: requirement.clone(),
		};
		self.launch(target).await
	}

	/// Stop the session. Stopping a runtime that is not running is a no-op.
	pub async fn stop(&self) {
		let remote = self.state.lock().remote.take();
		if let Some(remote) = remote {
			tracing::debug!(flavor = %self.flavor, "stopping runtime");
			remote.close().await;
		}
	}

	/// Close the current session, if any, and open a fresh one with the
	/// address and requirement of the last start.
	///
	/// # Errors
	///
	/// Returns [`Error::NotConnected`] if the runtime was never started.
	pub async fn reopen(&self) -> Result<()> {
		let target = self.state.lock().target.clone().ok_or_else(|| {
			Error::NotConnected(format!("{} runtime was never started", self.flavor))
		})?;

		tracing::debug!(flavor = %self.flavor, host_port = %target.host_port, "reopening runtime");
		self.stop().await;
		self.launch(target).await
	}

	async fn launch(&self, target: Target) -> Result<()> {
		let remote = self
			.launcher
			.launch(self.flavor, &target.host_port, &target.requirement)
			.await?;

		let previous = {
			let mut state = self.state.lock();
			state.target = Some(target);
			state.remote.replace(remote)
		};
		if let Some(stale) = previous {
			stale.close().await;
		}
		Ok(())
	}

	/// Channel over the running session.
	pub fn channel(&self) -> Result<Channel> {
		match self.state.lock().remote.as_ref() {
			Some(remote) if remote.is_open() => Ok(Channel::new(Arc::clone(remote))),
			_ => Err(Error::NotConnected(format!("{} runtime is not running", self.flavor))),
		}
	}
}
