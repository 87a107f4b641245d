mod common;

use chrono::NaiveDate;
use common::{Topology, cluster_credentials, sales};
use ibadm::{Cluster, Credentials, DROP_PERMISSION_CODE, DropMode, Error, InfobaseRef, LayeredCredentials, RuntimeFlavor, WpConnection};
use ibadm_protocol::{denial_anchor, denial_horizon, methods};

struct Fixture {
	topology: Topology,
	cluster: Cluster,
}

impl Fixture {
	async fn new() -> Self {
		let (topology, cluster) = Topology::with_cluster().await;
		Self { topology, cluster }
	}

	async fn connect(&self, infobase: InfobaseRef) -> WpConnection {
		let credentials = LayeredCredentials::new(cluster_credentials(), infobase.credentials().clone());
		self.cluster
			.alive_wprocess()
			.await
			.unwrap()
			.connect(infobase, credentials)
			.await
			.unwrap()
	}
}

#[tokio::test]
async fn connect_authenticates_both_layers_in_order() {
	let fx = Fixture::new().await;
	let conn = fx.connect(sales()).await;

	assert!(conn.is_connected());
	assert_eq!(
		fx.topology.platform.methods_on(RuntimeFlavor::WorkingProcess),
		vec![
			methods::AUTHENTICATE_ADMIN,
			methods::ADD_AUTHENTICATION,
			methods::CREATE_INFOBASE_INFO,
			methods::GET_INFOBASE_CONNECTIONS,
		]
	);
	assert_eq!(
		fx.topology.platform.calls_to(methods::AUTHENTICATE_ADMIN)[0].args,
		serde_json::json!(["cl-admin", "cl-pw"])
	);
	assert_eq!(
		fx.topology.platform.calls_to(methods::ADD_AUTHENTICATION)[0].args,
		serde_json::json!(["ib-admin", "ib-pw"])
	);
	assert_eq!(
		fx.topology.platform.calls_to(methods::CREATE_INFOBASE_INFO)[0].args,
		serde_json::json!(["Sales_DB"])
	);
}

#[tokio::test]
async fn failed_infobase_authentication_tears_the_connection_down() {
	let fx = Fixture::new().await;
	fx.topology
		.platform
		.fail(methods::GET_INFOBASE_CONNECTIONS, "Infobase administrator authentication error");

	let wp = fx.cluster.alive_wprocess().await.unwrap();
	let err = wp
		.connect(sales(), LayeredCredentials::new(cluster_credentials(), Credentials::default()))
		.await
		.unwrap_err();

	assert!(err.is_remote());
	// Only the agent session stays open.
	assert_eq!(fx.topology.platform.open_sessions(), 1);
}

#[tokio::test]
async fn schjobs_round_trip_restores_the_prior_flag() {
	for prior in [false, true] {
		let fx = Fixture::new().await;
		fx.topology
			.platform
			.state()
			.infobases
			.iter_mut()
			.for_each(|ib| ib.scheduled_jobs_denied = prior);
		let mut conn = fx.connect(sales()).await;

		assert_eq!(conn.lock_schjobs().await.unwrap(), prior);
		assert!(fx.topology.platform.infobase("Sales_DB").unwrap().scheduled_jobs_denied);

		conn.unlock_schjobs().await.unwrap();
		assert_eq!(
			fx.topology.platform.infobase("Sales_DB").unwrap().scheduled_jobs_denied,
			prior
		);
	}
}

#[tokio::test]
async fn unlocking_schjobs_without_a_saved_state_leaves_them_denied() {
	let fx = Fixture::new().await;
	let mut conn = fx.connect(sales()).await;

	conn.unlock_schjobs().await.unwrap();
	assert!(fx.topology.platform.infobase("Sales_DB").unwrap().scheduled_jobs_denied);
}

#[tokio::test]
async fn empty_permission_code_fails_before_any_remote_call() {
	let fx = Fixture::new().await;
	let conn = fx.connect(sales()).await;
	fx.topology.platform.clear_calls();

	let err = conn.lock_sessions_with_code(None, None, "", "maintenance").await.unwrap_err();
	assert!(err.is_invalid_argument());
	assert!(fx.topology.platform.calls().is_empty());

	let no_code = fx.connect(InfobaseRef::new("Sales_DB", Credentials::default(), "")).await;
	fx.topology.platform.clear_calls();
	let err = no_code.lock_sessions(None, None, "maintenance").await.unwrap_err();
	assert!(err.is_invalid_argument());
	assert!(fx.topology.platform.calls().is_empty());
}

#[tokio::test]
async fn lock_sessions_pushes_the_whole_record_once() {
	let fx = Fixture::new().await;
	let conn = fx.connect(sales()).await;
	fx.topology.platform.clear_calls();

	let from = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap().and_hms_opt(22, 0, 0).unwrap();
	conn.lock_sessions(Some(from), None, "maintenance").await.unwrap();

	assert_eq!(fx.topology.platform.calls_to(methods::UPDATE_INFOBASE).len(), 1);
	let ib = fx.topology.platform.infobase("Sales_DB").unwrap();
	assert!(ib.sessions_denied);
	assert_eq!(ib.denied_from, from);
	assert_eq!(ib.denied_to, denial_horizon());
	assert_eq!(ib.denied_message, "maintenance");
	assert_eq!(ib.permission_code, "4242");
	assert!(!conn.is_locked().await.unwrap());
}

#[tokio::test]
async fn unlock_sessions_collapses_the_window_and_clears_the_code() {
	let fx = Fixture::new().await;
	let conn = fx.connect(sales()).await;

	conn.lock_sessions_with_code(None, None, "other", "go away").await.unwrap();
	assert!(conn.is_locked().await.unwrap());

	conn.unlock_sessions().await.unwrap();
	let ib = fx.topology.platform.infobase("Sales_DB").unwrap();
	assert!(!ib.sessions_denied);
	assert_eq!(ib.denied_from, denial_anchor());
	assert_eq!(ib.denied_to, denial_anchor());
	assert_eq!(ib.denied_message, "");
	assert_eq!(ib.permission_code, "");
	assert!(!conn.is_locked().await.unwrap());
}

#[tokio::test]
async fn infobase_info_of_a_missing_infobase_is_a_domain_error() {
	let fx = Fixture::new().await;
	let conn = fx.connect(sales()).await;
	fx.topology.platform.state().infobases.clear();

	let err = conn.infobase_info().await.unwrap_err();
	assert!(matches!(err, Error::InfobaseNotFound { .. }));
	assert!(err.to_string().contains("not exists"));
	assert!(!conn.infobase_exists().await.unwrap());
}

#[tokio::test]
async fn drop_disconnects_every_connection_before_dropping() {
	let fx = Fixture::new().await;
	let mut conn = fx.connect(sales()).await;
	assert_eq!(conn.connections().await.unwrap().len(), 2);
	fx.topology.platform.clear_calls();

	conn.drop_infobase_with(DropMode::ClearDatabase).await.unwrap();

	let sequence = fx.topology.platform.methods_on(RuntimeFlavor::WorkingProcess);
	let drop_at = sequence.iter().position(|m| m == methods::DROP_INFOBASE).unwrap();
	let disconnects: Vec<_> = sequence
		.iter()
		.enumerate()
		.filter(|(_, m)| *m == methods::DISCONNECT)
		.map(|(i, _)| i)
		.collect();
	assert_eq!(disconnects.len(), 2);
	assert!(disconnects.iter().all(|&i| i < drop_at));

	let drop = &fx.topology.platform.calls_to(methods::DROP_INFOBASE)[0];
	assert_eq!(drop.args[0]["Name"], "Sales_DB");
	assert_eq!(drop.args[1], 2);
	assert!(fx.topology.platform.infobase("Sales_DB").is_none());
}

#[tokio::test]
async fn drop_locks_sessions_with_the_drop_code_first() {
	let fx = Fixture::new().await;
	let mut conn = fx.connect(sales()).await;
	fx.topology.platform.clear_calls();

	conn.drop_infobase(DropMode::KeepDatabase).await.unwrap();

	let updates = fx.topology.platform.calls_to(methods::UPDATE_INFOBASE);
	assert_eq!(updates.len(), 2);
	assert_eq!(updates[0].args[0]["PermissionCode"], DROP_PERMISSION_CODE);
	assert_eq!(updates[0].args[0]["DeniedMessage"], "");
	assert_eq!(updates[0].args[0]["SessionsDenied"], true);
	assert_eq!(updates[1].args[0]["ScheduledJobsDenied"], true);
}

#[tokio::test]
async fn invalid_drop_mode_fails_before_any_guard_step() {
	let fx = Fixture::new().await;
	let mut conn = fx.connect(sales()).await;
	fx.topology.platform.clear_calls();

	assert!(conn.drop_infobase("shred").await.unwrap_err().is_invalid_argument());
	assert!(conn.drop_infobase(3).await.unwrap_err().is_invalid_argument());
	assert!(fx.topology.platform.calls().is_empty());
	assert!(!fx.topology.platform.infobase("Sales_DB").unwrap().sessions_denied);
}

#[tokio::test]
async fn failed_drop_leaves_the_infobase_locked() {
	let fx = Fixture::new().await;
	let mut conn = fx.connect(sales()).await;
	fx.topology.platform.fail(methods::DROP_INFOBASE, "Database is in use");

	let err = conn.drop_infobase("delete").await.unwrap_err();
	assert!(err.is_remote());

	// No rollback: the guard steps stay applied.
	let ib = fx.topology.platform.infobase("Sales_DB").unwrap();
	assert!(ib.sessions_denied);
	assert!(ib.scheduled_jobs_denied);
	assert_eq!(ib.permission_code, DROP_PERMISSION_CODE);
	assert!(conn.connections().await.unwrap().is_empty());
	assert!(conn.is_locked().await.unwrap());
}

#[tokio::test]
async fn lists_and_probes_the_working_process() {
	let fx = Fixture::new().await;
	let conn = fx.connect(sales()).await;

	assert!(conn.ping().await);
	assert_eq!(conn.infobases().await.unwrap().len(), 2);
	assert!(conn.infobase_find("hr").await.unwrap().is_some());
	assert_eq!(conn.drop_connections().await.unwrap(), 2);
	assert!(conn.connections().await.unwrap().is_empty());

	conn.disconnect().await;
	conn.disconnect().await;
	assert!(!conn.is_connected());
}

#[tokio::test]
async fn schjobs_can_be_allowed_outright() {
	let fx = Fixture::new().await;
	let conn = fx.connect(sales()).await;

	conn.set_schjobs_denied(true).await.unwrap();
	assert!(fx.topology.platform.infobase("Sales_DB").unwrap().scheduled_jobs_denied);
	conn.set_schjobs_denied(false).await.unwrap();
	assert!(!fx.topology.platform.infobase("Sales_DB").unwrap().scheduled_jobs_denied);
}
