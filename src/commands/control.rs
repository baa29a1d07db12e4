//! Commands that change device state.
//!
//! Each prints `Ok` once the device acknowledges. Preset names given on the
//! command line are checked with
//! [`validate_preset_name`](crate::client::validate_preset_name) before
//! saving or deleting, since the device stores presets as files.

use anyhow::{Context, Result};

use crate::client::{validate_preset_name, DeviceClient};

/// Loads a stored preset.
pub fn load_preset(client: &DeviceClient, name: &str) -> Result<()> {
    client
        .load_preset(name)
        .with_context(|| format!("Failed to load preset {name:?}"))?;
    done()
}

/// Saves the live program under `name`, or under the active preset's name
/// when `name` is `None`.
pub fn save_preset(client: &DeviceClient, name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        let saved = client
            .save_current_preset()
            .context("Failed to save the active preset")?;
        log::info!("Saved active preset {saved:?}");
        return done();
    };
    validate_preset_name(name)?;
    client
        .save_preset(name.trim())
        .with_context(|| format!("Failed to save preset {name:?}"))?;
    done()
}

/// Deletes a stored preset.
pub fn delete_preset(client: &DeviceClient, name: &str) -> Result<()> {
    validate_preset_name(name)?;
    client
        .delete_preset(name.trim())
        .with_context(|| format!("Failed to delete preset {name:?}"))?;
    done()
}

/// Sets one parameter on a plugin instance.
pub fn set_param(client: &DeviceClient, plugin: &str, param: &str, value: &str) -> Result<()> {
    client
        .set_parameter(plugin, param, value)
        .with_context(|| format!("Failed to set {plugin}.{param}"))?;
    done()
}

/// Sets a file-valued parameter after validating it against the device's
/// configuration.
pub fn set_file_param(client: &DeviceClient, plugin: &str, param: &str, value: &str) -> Result<()> {
    client
        .set_file_parameter(plugin, param, value)
        .with_context(|| format!("Failed to set file {plugin}.{param}"))?;
    done()
}

/// Replaces the plugins of a chain.
pub fn set_chain(client: &DeviceClient, chain: &str, plugins: &[String]) -> Result<()> {
    client
        .set_chain(chain, plugins)
        .with_context(|| format!("Failed to set chain {chain}"))?;
    done()
}

/// Unloads a plugin instance.
pub fn release(client: &DeviceClient, plugin: &str) -> Result<()> {
    client
        .release_plugin(plugin)
        .with_context(|| format!("Failed to release {plugin}"))?;
    done()
}

/// Engages (`enabled`) or bypasses a plugin instance.
pub fn enable(client: &DeviceClient, plugin: &str, enabled: bool) -> Result<()> {
    client
        .set_plugin_enabled(plugin, enabled)
        .with_context(|| format!("Failed to toggle {plugin}"))?;
    done()
}

/// Sends a free-form command and prints the full response.
///
/// Words are joined with single spaces, so quote arguments for the device
/// inside one shell word: `stompbox raw 'SetParam Delay Mode "ping pong"'`.
pub fn raw(client: &DeviceClient, words: &[String]) -> Result<()> {
    let command = words.join(" ");
    let response = client
        .send_raw_command(&command)
        .with_context(|| format!("Command {command:?} failed"))?;
    print!("{response}");
    if !response.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn done() -> Result<()> {
    println!("Ok");
    Ok(())
}
