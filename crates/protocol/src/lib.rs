//! Wire types for the cluster administration call surface.
//!
//! This crate contains the serde-serializable types exchanged with the
//! server agent and its working processes. These types represent the
//! "protocol layer": the shapes of remote objects as they are passed to
//! and returned from remote calls.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization and small accessors
//! - **Handle-carrying**: Every remote object keeps the opaque [`Handle`]
//!   the call surface uses to find it again when it is passed back as an
//!   argument
//! - **Stable**: Changes only when the call surface changes
//!
//! The stateful endpoint objects are built on top of these types in `ibadm`.

pub mod credentials;
pub mod drop_mode;
pub mod methods;
pub mod types;

pub use credentials::*;
pub use drop_mode::*;
pub use types::*;
