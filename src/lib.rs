//! Stompbox Bridge - control-plane client for the Stompbox effects device.
//!
//! This crate talks to a Stompbox audio-effects engine over its plain-text
//! TCP control socket: it sends single-line commands, frames the line-based
//! responses, and turns configuration and program dumps into typed values.
//!
//! # Architecture
//!
//! ```text
//! DeviceClient (façade: one method per operation, Error-line scan)
//!   ├── CommandChannel  (dial, write, bounded read until a stop predicate)
//!   │     └── protocol  (token codec, termination policies)
//!   └── parse           (config / program / preset dumps)
//! ```
//!
//! Nothing is shared between calls: every operation dials, exchanges and
//! closes its own connection.
//!
//! # Modules
//!
//! - [`client`] - Device operations ([`DeviceClient`])
//! - [`channel`] - One-exchange TCP transport
//! - [`protocol`] - Quoting codec and response termination
//! - [`parse`] - Dump parsers and result types
//! - [`config`] - File and environment configuration
//! - [`commands`] - CLI subcommand implementations

// Library modules
pub mod channel;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod parse;
pub mod protocol;

// Re-export commonly used types
pub use channel::CommandChannel;
pub use client::{validate_preset_name, DeviceClient};
pub use config::Config;
pub use error::{DeviceError, Result};
pub use parse::{Catalog, FileTreeDef, ParamDef, PluginDef, ProgramState};
