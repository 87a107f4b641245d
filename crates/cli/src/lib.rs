//! `ibadm` command line front end.
//!
//! Every invocation resolves a [`config::Settings`] from the profile file
//! and the command line, opens one agent session through the automation
//! bridge, runs a single command and prints a [`output::CommandResult`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
