//! In-memory administration platform for integration tests.
//!
//! [`FakePlatform`] implements [`Launcher`]; every runtime it opens shares
//! one [`PlatformState`] and records each call it receives. Liveness is
//! real: endpoints that must answer a TCP probe point at loopback
//! listeners, dead ones at a port nobody listens on.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ibadm::{
	Agent, Cluster, ClusterInfo, ConnectionInfo, Credentials, Error, Handle, InfobaseInfo, InfobaseRef,
	InfobaseShort, Launcher, PlatformRequirement, RemoteCall, Result, RuntimeFlavor, SessionInfo,
	WorkingProcessInfo,
};
use ibadm_protocol::{denial_anchor, methods};
use ibadm_runtime::BoxFuture;
use parking_lot::{Mutex, MutexGuard};
use serde_json::{Value, json};

pub const AGENT_USER: &str = "admin";
pub const AGENT_PASSWORD: &str = "secret";
pub const CLUSTER_PORT: u16 = 1541;
pub const REQUIREMENT: &str = "~> 8.3";

/// One recorded remote call.
#[derive(Debug, Clone)]
pub struct Call {
	pub flavor: RuntimeFlavor,
	pub host_port: String,
	pub method: String,
	pub args: Value,
}

#[derive(Debug, Clone)]
pub struct Launch {
	pub flavor: RuntimeFlavor,
	pub host_port: String,
	pub requirement: PlatformRequirement,
}

#[derive(Default)]
pub struct PlatformState {
	pub agent_authenticated: bool,
	pub clusters: Vec<ClusterInfo>,
	pub cluster_infobases: Vec<InfobaseShort>,
	pub sessions: Vec<SessionInfo>,
	pub processes: Vec<WorkingProcessInfo>,
	pub infobases: Vec<InfobaseInfo>,
	/// Client connections keyed by upper-cased infobase name.
	pub connections: HashMap<String, Vec<ConnectionInfo>>,
	/// Method name -> (remote error message, fire only once).
	pub failures: HashMap<String, (String, bool)>,
	pub calls: Vec<Call>,
	pub launches: Vec<Launch>,
	pub refuse_launch: bool,
}

#[derive(Default)]
pub struct FakePlatform {
	state: Arc<Mutex<PlatformState>>,
	remotes: Mutex<Vec<Arc<FakeRemote>>>,
}

impl FakePlatform {
	pub fn state(&self) -> MutexGuard<'_, PlatformState> {
		self.state.lock()
	}

	pub fn calls(&self) -> Vec<Call> {
		self.state.lock().calls.clone()
	}

	pub fn methods(&self) -> Vec<String> {
		self.state.lock().calls.iter().map(|c| c.method.clone()).collect()
	}

	pub fn methods_on(&self, flavor: RuntimeFlavor) -> Vec<String> {
		self.state
			.lock()
			.calls
			.iter()
			.filter(|c| c.flavor == flavor)
			.map(|c| c.method.clone())
			.collect()
	}

	pub fn calls_to(&self, method: &str) -> Vec<Call> {
		self.state.lock().calls.iter().filter(|c| c.method == method).cloned().collect()
	}

	pub fn clear_calls(&self) {
		self.state.lock().calls.clear();
	}

	pub fn launches(&self, flavor: RuntimeFlavor) -> Vec<Launch> {
		self.state
			.lock()
			.launches
			.iter()
			.filter(|l| l.flavor == flavor)
			.cloned()
			.collect()
	}

	/// Make every call to `method` fail with a remote error.
	pub fn fail(&self, method: &str, message: &str) {
		self.state.lock().failures.insert(method.to_string(), (message.to_string(), false));
	}

	/// Make the next call to `method` fail with a remote error.
	pub fn fail_once(&self, method: &str, message: &str) {
		self.state.lock().failures.insert(method.to_string(), (message.to_string(), true));
	}

	pub fn infobase(&self, name: &str) -> Option<InfobaseInfo> {
		self.state
			.lock()
			.infobases
			.iter()
			.find(|ib| ib.name.eq_ignore_ascii_case(name))
			.cloned()
	}

	/// Close every launched runtime, as if the bridge went away.
	pub async fn close_all(&self) {
		let remotes: Vec<_> = self.remotes.lock().clone();
		for remote in remotes {
			remote.close().await;
		}
	}

	/// Runtimes launched and not closed.
	pub fn open_sessions(&self) -> usize {
		self.remotes.lock().iter().filter(|r| r.is_open()).count()
	}
}

impl Launcher for FakePlatform {
	fn launch<'a>(
		&'a self,
		flavor: RuntimeFlavor,
		host_port: &'a str,
		requirement: &'a PlatformRequirement,
	) -> BoxFuture<'a, Result<Arc<dyn RemoteCall>>> {
		Box::pin(async move {
			let mut state = self.state.lock();
			if state.refuse_launch {
				return Err(Error::ConnectionFailed {
					host_port: host_port.to_string(),
					reason: format!("platform {requirement} not installed"),
				});
			}
			state.launches.push(Launch {
				flavor,
				host_port: host_port.to_string(),
				requirement: requirement.clone(),
			});
			drop(state);

			let remote = Arc::new(FakeRemote {
				flavor,
				host_port: host_port.to_string(),
				open: AtomicBool::new(true),
				state: Arc::clone(&self.state),
			});
			self.remotes.lock().push(Arc::clone(&remote));
			Ok(remote as Arc<dyn RemoteCall>)
		})
	}
}

pub struct FakeRemote {
	flavor: RuntimeFlavor,
	host_port: String,
	open: AtomicBool,
	state: Arc<Mutex<PlatformState>>,
}

fn remote_error(message: impl Into<String>) -> Error {
	Error::remote("WIN32OLERuntimeError", message)
}

fn name_arg(args: &Value, index: usize) -> String {
	args[index]["Name"].as_str().unwrap_or_default().to_ascii_uppercase()
}

impl FakeRemote {
	fn handle(&self, method: &str, args: Value) -> Result<Value> {
		let mut state = self.state.lock();
		state.calls.push(Call {
			flavor: self.flavor,
			host_port: self.host_port.clone(),
			method: method.to_string(),
			args: args.clone(),
		});

		if let Some((message, once)) = state.failures.get(method).cloned() {
			if once {
				state.failures.remove(method);
			}
			return Err(remote_error(message));
		}

		match self.flavor {
			RuntimeFlavor::Agent => Self::agent_call(&mut state, method, &args),
			RuntimeFlavor::WorkingProcess => Self::working_process_call(&mut state, method, &args),
		}
	}

	fn agent_call(state: &mut PlatformState, method: &str, args: &Value) -> Result<Value> {
		match method {
			methods::GET_CLUSTERS => Ok(serde_json::to_value(&state.clusters)?),
			methods::GET_AGENT_ADMINS if state.agent_authenticated => Ok(json!([{"Name": AGENT_USER}])),
			methods::GET_AGENT_ADMINS => Err(remote_error("Administrator authentication required")),
			methods::AUTHENTICATE_AGENT => {
				if args[0] == AGENT_USER && args[1] == AGENT_PASSWORD {
					state.agent_authenticated = true;
					Ok(Value::Null)
				} else {
					Err(remote_error("Administrator authentication error"))
				}
			}
			methods::AUTHENTICATE => Ok(Value::Null),
			methods::GET_CLUSTER_INFOBASES => Ok(serde_json::to_value(&state.cluster_infobases)?),
			methods::GET_INFOBASE_SESSIONS => Ok(serde_json::to_value(&state.sessions)?),
			methods::GET_WORKING_PROCESSES => Ok(serde_json::to_value(&state.processes)?),
			methods::TERMINATE_SESSION => {
				let id = args[1]["SessionId"].as_u64().unwrap_or_default();
				let before = state.sessions.len();
				state.sessions.retain(|s| u64::from(s.session_id) != id);
				if state.sessions.len() == before {
					return Err(remote_error(format!("Session {id} not found")));
				}
				Ok(Value::Null)
			}
			other => Err(remote_error(format!("agent: unknown method {other}"))),
		}
	}

	fn working_process_call(state: &mut PlatformState, method: &str, args: &Value) -> Result<Value> {
		match method {
			methods::AUTHENTICATE_ADMIN | methods::ADD_AUTHENTICATION => Ok(Value::Null),
			methods::CREATE_INFOBASE_INFO => Ok(serde_json::to_value(infobase_info("ib@probe", args[0].as_str().unwrap_or_default()))?),
			methods::GET_INFOBASES => Ok(serde_json::to_value(&state.infobases)?),
			methods::GET_INFOBASE_CONNECTIONS => {
				let conns = state.connections.get(&name_arg(args, 0)).cloned().unwrap_or_default();
				Ok(serde_json::to_value(conns)?)
			}
			methods::UPDATE_INFOBASE => {
				let updated: InfobaseInfo = serde_json::from_value(args[0].clone())?;
				let slot = state
					.infobases
					.iter_mut()
					.find(|ib| ib.name.eq_ignore_ascii_case(&updated.name))
					.ok_or_else(|| remote_error("Infobase not found"))?;
				*slot = updated;
				Ok(Value::Null)
			}
			methods::DISCONNECT => {
				let id = args[0]["ConnId"].as_u64().unwrap_or_default();
				for conns in state.connections.values_mut() {
					conns.retain(|c| u64::from(c.conn_id) != id);
				}
				Ok(Value::Null)
			}
			methods::DROP_INFOBASE => {
				let name = name_arg(args, 0);
				state.infobases.retain(|ib| ib.name.to_ascii_uppercase() != name);
				Ok(Value::Null)
			}
			other => Err(remote_error(format!("working process: unknown method {other}"))),
		}
	}
}

impl RemoteCall for FakeRemote {
	fn call(&self, method: &str, args: Value) -> BoxFuture<'_, Result<Value>> {
		let result = if self.is_open() {
			self.handle(method, args)
		} else {
			Err(Error::ChannelClosed)
		};
		Box::pin(async move { result })
	}

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(async { self.open.store(false, Ordering::SeqCst) })
	}

	fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst)
	}
}

pub fn infobase_info(handle: &str, name: &str) -> InfobaseInfo {
	InfobaseInfo {
		handle: Handle::new(handle),
		name: name.to_string(),
		denied_from: denial_anchor(),
		denied_to: denial_anchor(),
		denied_message: String::new(),
		permission_code: String::new(),
		sessions_denied: false,
		scheduled_jobs_denied: false,
	}
}

pub fn working_process(handle: &str, port: u16, running: bool) -> WorkingProcessInfo {
	WorkingProcessInfo {
		handle: Handle::new(handle),
		host_name: "127.0.0.1".to_string(),
		main_port: port,
		running: i32::from(running),
		pid: format!("{port}"),
	}
}

pub fn session(id: u32, user: &str) -> SessionInfo {
	SessionInfo {
		handle: Handle::new(format!("session@{id}")),
		session_id: id,
		app_id: "1CV8C".to_string(),
		user_name: user.to_string(),
		host: "client".to_string(),
	}
}

pub fn connection(id: u32) -> ConnectionInfo {
	ConnectionInfo {
		handle: Handle::new(format!("conn@{id}")),
		conn_id: id,
		app_id: "1CV8C".to_string(),
		host: "client".to_string(),
	}
}

/// Bound loopback listener; the port answers probes while it lives.
pub fn listener() -> (TcpListener, u16) {
	let listener = TcpListener::bind("127.0.0.1:0").unwrap();
	let port = listener.local_addr().unwrap().port();
	(listener, port)
}

/// Port nobody listens on.
pub fn dead_port() -> u16 {
	listener().1
}

pub fn sales() -> InfobaseRef {
	InfobaseRef::new("Sales_DB", Credentials::with_user("ib-admin", "ib-pw"), "4242")
}

pub fn cluster_credentials() -> Credentials {
	Credentials::with_user("cl-admin", "cl-pw")
}

/// A server with one cluster, two registered infobases, two sessions and
/// one running, reachable working process serving `Sales_DB` with two
/// client connections.
pub struct Topology {
	pub platform: Arc<FakePlatform>,
	pub agent: Arc<Agent>,
	pub agent_listener: TcpListener,
	pub wp_listener: Option<TcpListener>,
	pub wp_port: u16,
}

impl Topology {
	pub fn new() -> Self {
		let (agent_listener, agent_port) = listener();
		let (wp_listener, wp_port) = listener();
		let platform = Arc::new(FakePlatform::default());

		{
			let mut state = platform.state();
			state.clusters = vec![
				ClusterInfo {
					handle: Handle::new("cluster@main"),
					host_name: "127.0.0.1".to_string(),
					main_port: CLUSTER_PORT,
					name: "main".to_string(),
				},
				ClusterInfo {
					handle: Handle::new("cluster@backup"),
					host_name: "Backup.Local".to_string(),
					main_port: 1641,
					name: "backup".to_string(),
				},
			];
			state.cluster_infobases = vec![
				InfobaseShort {
					handle: Handle::new("ibs@sales"),
					name: "Sales_DB".to_string(),
					descr: "sales".to_string(),
				},
				InfobaseShort {
					handle: Handle::new("ibs@hr"),
					name: "HR".to_string(),
					descr: String::new(),
				},
			];
			state.sessions = vec![session(1, "alice"), session(2, "bob")];
			state.processes = vec![working_process("wp@1", wp_port, true)];
			state.infobases = vec![infobase_info("ib@sales", "Sales_DB"), infobase_info("ib@hr", "HR")];
			state
				.connections
				.insert("SALES_DB".to_string(), vec![connection(11), connection(12)]);
		}

		let agent = Agent::new(
			&format!("127.0.0.1:{agent_port}"),
			Credentials::with_user(AGENT_USER, AGENT_PASSWORD),
			Arc::clone(&platform) as Arc<dyn Launcher>,
		)
		.unwrap();

		Self {
			platform,
			agent: Arc::new(agent),
			agent_listener,
			wp_listener: Some(wp_listener),
			wp_port,
		}
	}

	/// Topology with the agent already connected.
	pub async fn connected() -> Self {
		let topology = Self::new();
		topology
			.agent
			.connect(&PlatformRequirement::new(REQUIREMENT))
			.await
			.unwrap();
		topology
	}

	/// Connected topology plus the `main` cluster attached to its agent.
	pub async fn with_cluster() -> (Self, Cluster) {
		let topology = Self::connected().await;
		let mut cluster = Cluster::new(&format!("127.0.0.1:{CLUSTER_PORT}"), cluster_credentials()).unwrap();
		cluster.attach(&topology.agent).await.unwrap();
		(topology, cluster)
	}
}
