//! Read-only device queries.
//!
//! Dumps print the device's raw text by default, or the parsed structure as
//! pretty JSON with `--json`.
//!
//! # Examples
//!
//! ```bash
//! stompbox --addr 192.168.1.40:24356 dump-program --json
//! stompbox presets
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::client::DeviceClient;
use crate::parse::{parse_config, parse_presets, parse_program};

/// Prints the configuration dump.
///
/// # Errors
///
/// Returns an error if the exchange fails or the device reports an error.
pub fn config(client: &DeviceClient, json: bool) -> Result<()> {
    let raw = client
        .dump_configuration()
        .context("Failed to dump configuration")?;
    if json {
        print_json(&parse_config(&raw))
    } else {
        print_raw(&raw);
        Ok(())
    }
}

/// Prints the program dump.
///
/// # Errors
///
/// Returns an error if the exchange fails, the device reports an error, or
/// (with `json`) the dump contains a malformed directive.
pub fn program(client: &DeviceClient, json: bool) -> Result<()> {
    let raw = client.dump_program().context("Failed to dump program")?;
    if json {
        print_json(&parse_program(&raw).context("Failed to parse program dump")?)
    } else {
        print_raw(&raw);
        Ok(())
    }
}

/// Prints stored preset names, one per line or as a JSON array.
///
/// # Errors
///
/// Returns an error if the exchange fails or the device reports an error.
pub fn presets(client: &DeviceClient, json: bool) -> Result<()> {
    let raw = client.list_presets().context("Failed to list presets")?;
    let names = parse_presets(&raw);
    if json {
        return print_json(&names);
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Prints the active preset name.
///
/// # Errors
///
/// Returns an error if the program dump fails or cannot be parsed.
pub fn current_preset(client: &DeviceClient) -> Result<()> {
    let name = client
        .current_preset()
        .context("Failed to read active preset")?;
    println!("{name}");
    Ok(())
}

fn print_raw(raw: &str) {
    for line in raw.lines() {
        println!("{line}");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize result")
}
