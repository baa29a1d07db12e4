//! Stompbox CLI - command-line access to a Stompbox effects device.
//!
//! This is the main binary entry point. See the `stompbox_bridge` library
//! for the core functionality.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stompbox_bridge::{commands, Config};

// CLI
#[derive(Parser)]
#[command(name = "stompbox")]
#[command(version)]
#[command(about = "Control-plane client for the Stompbox effects device")]
struct Cli {
    /// Path to a JSON config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Device address as host:port, overriding config and environment
    #[arg(long, global = true)]
    addr: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the plugin catalog
    DumpConfig {
        /// Print the parsed catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump the live program (preset, chains, slots, parameter values)
    DumpProgram {
        /// Print the parsed program as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored presets
    Presets {
        /// Print names as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print the active preset name
    CurrentPreset,
    /// Load a stored preset
    Load {
        /// Preset name
        name: String,
    },
    /// Save the live program as a preset
    Save {
        /// Preset name (default: the active preset)
        name: Option<String>,
    },
    /// Delete a stored preset
    Delete {
        /// Preset name
        name: String,
    },
    /// Set a parameter on a plugin instance
    SetParam {
        /// Plugin instance (e.g. NoiseGate_2)
        plugin: String,
        /// Parameter name
        param: String,
        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Set a file-valued parameter, checked against the device's file lists
    SetFileParam {
        /// Plugin instance (e.g. NAM_1)
        plugin: String,
        /// Parameter name
        param: String,
        /// File to select
        value: String,
    },
    /// Replace the plugins of a chain
    SetChain {
        /// Chain name
        chain: String,
        /// Plugin instances in signal order
        plugins: Vec<String>,
    },
    /// Unload a plugin instance
    Release {
        /// Plugin instance
        plugin: String,
    },
    /// Engage a plugin instance (or bypass it with --off)
    Enable {
        /// Plugin instance
        plugin: String,
        /// Bypass instead of engaging
        #[arg(long)]
        off: bool,
    },
    /// Send a raw command line and print the response
    Raw {
        /// Command words, joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for dumps and JSON
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(addr) = &cli.addr {
        config.set_address(addr)?;
    }
    let client = config.client()?;
    log::debug!("Using device at {}", client.channel().addr());

    match cli.command {
        Commands::DumpConfig { json } => commands::dump::config(&client, json)?,
        Commands::DumpProgram { json } => commands::dump::program(&client, json)?,
        Commands::Presets { json } => commands::dump::presets(&client, json)?,
        Commands::CurrentPreset => commands::dump::current_preset(&client)?,
        Commands::Load { name } => commands::control::load_preset(&client, &name)?,
        Commands::Save { name } => commands::control::save_preset(&client, name.as_deref())?,
        Commands::Delete { name } => commands::control::delete_preset(&client, &name)?,
        Commands::SetParam {
            plugin,
            param,
            value,
        } => commands::control::set_param(&client, &plugin, &param, &value)?,
        Commands::SetFileParam {
            plugin,
            param,
            value,
        } => commands::control::set_file_param(&client, &plugin, &param, &value)?,
        Commands::SetChain { chain, plugins } => {
            commands::control::set_chain(&client, &chain, &plugins)?;
        }
        Commands::Release { plugin } => commands::control::release(&client, &plugin)?,
        Commands::Enable { plugin, off } => commands::control::enable(&client, &plugin, !off)?,
        Commands::Raw { command } => commands::control::raw(&client, &command)?,
    }

    Ok(())
}
