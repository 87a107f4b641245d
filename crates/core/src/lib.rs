//! ibadm: administration of clustered application server infobases
//!
//! This crate drives the server agent, cluster and working process
//! endpoints of a clustered application server through an opaque remote
//! call surface ([`Launcher`] / [`RemoteCall`]).
//!
//! # Control flow
//!
//! ```text
//! Agent::connect ─▶ Cluster::attach ─▶ Cluster::alive_wprocess
//!                                         │
//!                                         ▼
//!                     WorkingProcess::connect ─▶ WpConnection
//!                                                 (lock / unlock / drop)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ibadm::{Agent, BridgeLauncher, Cluster, Credentials, DropMode, InfobaseRef, PlatformRequirement};
//!
//! let launcher = Arc::new(BridgeLauncher::default());
//! let agent = Arc::new(Agent::new("srv", Credentials::default(), launcher)?);
//! agent.connect(&PlatformRequirement::new("~> 8.3")).await?;
//!
//! let mut cluster = Cluster::new("srv:1541", Credentials::with_user("admin", "secret"))?;
//! cluster.attach(&agent).await?;
//!
//! let infobase = InfobaseRef::new("sales", Credentials::with_user("ib-admin", ""), "4242");
//! cluster.drop_infobase(&infobase, DropMode::KeepDatabase).await?;
//!
//! cluster.disconnect().await;
//! agent.disconnect().await;
//! ```

pub mod agent;
pub mod api;
pub mod cluster;
pub mod infobase;
pub mod views;
pub mod wp_connection;

pub use agent::Agent;
pub use api::{AgentApi, WorkingProcessApi};
pub use cluster::Cluster;
pub use infobase::{InfobaseRef, LayeredCredentials};
pub use views::{Session, WorkingProcess};
pub use wp_connection::{DROP_PERMISSION_CODE, WpConnection};

pub use ibadm_protocol::{
	ClusterInfo, ConnectionInfo, Credentials, DropMode, Handle, InfobaseInfo, InfobaseShort, InvalidDropMode,
	SessionInfo, WorkingProcessInfo,
};
pub use ibadm_runtime::{
	AuthenticatableEndpoint, BridgeLauncher, DEFAULT_BRIDGE_URL, Endpoint, Error, Launcher, PlatformRequirement,
	RemoteCall, Result, RuntimeFlavor,
};
