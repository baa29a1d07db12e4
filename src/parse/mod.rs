//! Parsers for the device's dump responses.
//!
//! - [`config`]: `Dump Config`, tolerant, never fails
//! - [`program`]: `Dump Program`, strict, fails on malformed directives
//! - [`presets`]: `List Presets`

pub mod config;
pub mod presets;
pub mod program;

pub use config::{
    instance_base_name, parse_config, Catalog, FileOption, FileTreeDef, ParamDef, PluginDef,
};
pub use presets::parse_presets;
pub use program::{parse_program, ProgramState};
