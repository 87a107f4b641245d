//! Connect/authenticate state machine shared by every endpoint kind.
//!
//! ```text
//! Disconnected ──start──▶ Connected ──authenticate──▶ Authenticated
//!       ▲                     │
//!       └──── stop on auth failure
//! ```
//!
//! An endpoint is never left with a running runtime after its
//! authentication failed: [`AuthenticatableEndpoint::open`] stops the
//! runtime and returns the original error.

use async_trait::async_trait;

use crate::error::Result;
use crate::remote::PlatformRequirement;
use crate::runtime::Runtime;

/// An endpoint that owns a [`Runtime`] and knows how to authenticate on it.
#[async_trait]
pub trait AuthenticatableEndpoint: Send + Sync {
	/// Credentials input for [`authenticate`](Self::authenticate).
	type Credentials: Send + Sync;

	fn runtime(&self) -> &Runtime;

	/// True if the current session is already authenticated.
	async fn is_authenticated(&self) -> bool;

	/// Authenticate on the running session.
	async fn authenticate(&self, credentials: &Self::Credentials) -> Result<()>;

	/// Start the runtime if needed, then authenticate unless already authenticated.
	async fn open(
		&self,
		host_port: &str,
		requirement: &PlatformRequirement,
		credentials: &Self::Credentials,
	) -> Result<()> {
		let runtime = self.runtime();
		runtime.start(host_port, requirement).await?;

		if self.is_authenticated().await {
			return Ok(());
		}

		if let Err(err) = self.authenticate(credentials).await {
			tracing::warn!(flavor = %runtime.flavor(), %host_port, error = %err, "authentication failed, stopping runtime");
			runtime.stop().await;
			return Err(err);
		}

		tracing::debug!(flavor = %runtime.flavor(), %host_port, "authenticated");
		Ok(())
	}

	/// Stop the runtime. Idempotent.
	async fn disconnect(&self) {
		self.runtime().stop().await;
	}

	fn is_connected(&self) -> bool {
		self.runtime().is_running()
	}
}
