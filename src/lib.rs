//! # ZFS Backup Agent
//!
//! Core of a host-resident agent that runs ZFS snapshot lifecycle
//! operations and streams snapshot data between machines through mbuffer,
//! on behalf of a remote controller.
//!
//! ## Modules
//!
//! - `commands` - Pure request-to-command mapping for the zfs and mbuffer tools
//! - `config` - Agent configuration with TOML file and environment loading
//! - `notify` - Deferred completion notifications to the controller API
//! - `ops` - The public operation facade (create, destroy, send, receive)
//! - `subprocess` - Process supervision and two-process pipeline orchestration

pub mod commands;
pub mod config;
pub mod notify;
pub mod ops;
pub mod subprocess;
