//! CLI subcommand implementations for the `stompbox` binary.
//!
//! Each command takes a ready [`DeviceClient`](crate::client::DeviceClient),
//! performs one device operation, and prints the result to stdout. Commands
//! are organized into submodules by kind:
//!
//! - [`dump`] - Read-only queries (config/program dumps, presets)
//! - [`control`] - Commands that change device state
//!
//! # Usage
//!
//! ```ignore
//! use stompbox_bridge::{commands, Config};
//!
//! let client = Config::load(None)?.client()?;
//! commands::dump::program(&client, true)?;
//! commands::control::load_preset(&client, "Clean")?;
//! ```

pub mod control;
pub mod dump;

// Re-export commonly used functions for convenience
#[doc(inline)]
pub use control::{load_preset, raw, set_param};
#[doc(inline)]
pub use dump::{config as dump_config, presets as list_presets, program as dump_program};
