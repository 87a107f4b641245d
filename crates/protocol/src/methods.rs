//! Remote method names.
//!
//! Agent-side methods are invoked on an agent runtime; working process
//! methods on a runtime opened against a working process.

// Agent runtime
pub const GET_CLUSTERS: &str = "GetClusters";
pub const GET_AGENT_ADMINS: &str = "GetAgentAdmins";
pub const AUTHENTICATE_AGENT: &str = "AuthenticateAgent";
pub const AUTHENTICATE: &str = "Authenticate";
pub const GET_CLUSTER_INFOBASES: &str = "GetInfoBases";
pub const GET_INFOBASE_SESSIONS: &str = "GetInfoBaseSessions";
pub const GET_WORKING_PROCESSES: &str = "GetWorkingProcesses";
pub const TERMINATE_SESSION: &str = "TerminateSession";

// Working process runtime
pub const AUTHENTICATE_ADMIN: &str = "AuthenticateAdmin";
pub const ADD_AUTHENTICATION: &str = "AddAuthentication";
pub const CREATE_INFOBASE_INFO: &str = "CreateInfoBaseInfo";
pub const GET_INFOBASES: &str = "GetInfoBases";
pub const GET_INFOBASE_CONNECTIONS: &str = "GetInfoBaseConnections";
pub const UPDATE_INFOBASE: &str = "UpdateInfoBase";
pub const DISCONNECT: &str = "Disconnect";
pub const DROP_INFOBASE: &str = "DropInfoBase";
