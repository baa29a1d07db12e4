//! Device client façade.
//!
//! [`DeviceClient`] is the only type collaborators need: one method per
//! device operation, each returning either the raw response text or a parsed
//! structure. Every method runs one [`CommandChannel::exchange`] and then
//! scans the whole response for an `Error` line, which wins over a trailing
//! `Ok`.
//!
//! # Operations
//!
//! | Method                 | Wire command        | Ends after        |
//! |------------------------|---------------------|-------------------|
//! | `dump_configuration`   | `Dump Config`       | `EndConfig`, `Ok` |
//! | `dump_program`         | `Dump Program`      | `EndProgram`, `Ok`|
//! | `list_presets`         | `List Presets`      | `Ok`              |
//! | `set_parameter`        | `SetParam p n v`    | `Ok`              |
//! | `load_preset`, ...     | `LoadPreset n`, ... | `Ok`              |
//! | `send_raw_command`     | as given            | `Ok`              |

use crate::channel::CommandChannel;
use crate::constants::{
    ENABLED_PARAM, END_CONFIG, END_PROGRAM, ERROR_MARKER, FILE_PARAM_TYPE,
};
use crate::error::{DeviceError, Result};
use crate::parse::{parse_config, parse_presets, parse_program, Catalog, ProgramState};
use crate::protocol::codec::breaks_line;
use crate::protocol::{command_line, normalize_command, Termination};

/// Longest preset name accepted by [`validate_preset_name`], in bytes.
const MAX_PRESET_NAME_LEN: usize = 200;

/// Client for one Stompbox control endpoint.
///
/// Holds only immutable settings, so it can be cloned and shared across
/// threads freely. Calls are not serialized: two concurrent calls open two
/// connections and may interleave at the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceClient {
    channel: CommandChannel,
}

impl DeviceClient {
    /// Client for `addr` (`host:port`) with default timeouts and size cap.
    pub fn new(addr: impl Into<String>) -> Self {
        Self::from_channel(CommandChannel::new(addr))
    }

    /// Client over a preconfigured channel.
    pub fn from_channel(channel: CommandChannel) -> Self {
        Self { channel }
    }

    /// The underlying channel settings.
    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    // ========================================================================
    // Dumps
    // ========================================================================

    /// Raw text of `Dump Config`, through the `Ok` after `EndConfig`.
    ///
    /// # Errors
    ///
    /// Any channel error, or [`DeviceError::ProtocolError`] if the device
    /// reported an error line.
    pub fn dump_configuration(&self) -> Result<String> {
        self.run("Dump Config\r\n", Termination::AfterMarker(END_CONFIG))
    }

    /// `Dump Config`, parsed into a plugin catalog.
    ///
    /// # Errors
    ///
    /// Same as [`Self::dump_configuration`]; the parse itself cannot fail.
    pub fn dump_configuration_parsed(&self) -> Result<Catalog> {
        self.dump_configuration().map(|raw| parse_config(&raw))
    }

    /// Raw text of `Dump Program`, through the `Ok` after `EndProgram`.
    ///
    /// # Errors
    ///
    /// Any channel error, or [`DeviceError::ProtocolError`].
    pub fn dump_program(&self) -> Result<String> {
        self.run("Dump Program\r\n", Termination::AfterMarker(END_PROGRAM))
    }

    /// `Dump Program`, parsed into live program state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::dump_program`], plus
    /// [`DeviceError::MalformedDirective`] from the parser.
    pub fn dump_program_parsed(&self) -> Result<ProgramState> {
        parse_program(&self.dump_program()?)
    }

    /// Name of the active preset, empty when the program names none.
    ///
    /// # Errors
    ///
    /// Same as [`Self::dump_program_parsed`].
    pub fn current_preset(&self) -> Result<String> {
        Ok(self.dump_program_parsed()?.active_preset)
    }

    /// Raw text of `List Presets`.
    ///
    /// # Errors
    ///
    /// Any channel error, or [`DeviceError::ProtocolError`].
    pub fn list_presets(&self) -> Result<String> {
        self.run("List Presets\r\n", Termination::Ack)
    }

    /// Stored preset names in device order.
    ///
    /// # Errors
    ///
    /// Same as [`Self::list_presets`].
    pub fn list_presets_parsed(&self) -> Result<Vec<String>> {
        self.list_presets().map(|raw| parse_presets(&raw))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Send a free-form command and read through the first `Ok`.
    ///
    /// Surrounding whitespace is trimmed and CR-LF appended.
    ///
    /// # Errors
    ///
    /// [`DeviceError::InvalidArgument`] for an empty or multi-line command,
    /// any channel error, or [`DeviceError::ProtocolError`].
    pub fn send_raw_command(&self, command: &str) -> Result<String> {
        let trimmed = command.trim();
        if trimmed.is_empty() {
            return Err(DeviceError::InvalidArgument("empty command".to_string()));
        }
        if breaks_line(trimmed) {
            return Err(DeviceError::InvalidArgument(format!(
                "command spans several lines: {trimmed:?}"
            )));
        }
        self.run(&normalize_command(trimmed), Termination::Ack)
    }

    /// Set one parameter on a plugin instance.
    ///
    /// # Errors
    ///
    /// [`DeviceError::InvalidArgument`] for an empty plugin or parameter
    /// name or an argument containing a line break, any channel error, or
    /// [`DeviceError::ProtocolError`].
    pub fn set_parameter(&self, plugin: &str, param: &str, value: &str) -> Result<()> {
        require_name("plugin", plugin)?;
        require_name("param", param)?;
        self.command("SetParam", &[plugin, param, value])
    }

    /// Load a stored preset.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_parameter`].
    pub fn load_preset(&self, name: &str) -> Result<()> {
        require_name("preset", name)?;
        self.command("LoadPreset", &[name])
    }

    /// Save the live program as a preset.
    ///
    /// The device treats preset names as file names; callers taking names
    /// from users should check them with [`validate_preset_name`] first.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_parameter`].
    pub fn save_preset(&self, name: &str) -> Result<()> {
        require_name("preset", name)?;
        self.command("SavePreset", &[name])
    }

    /// Save the live program back under the active preset's name.
    ///
    /// Returns the name that was saved.
    ///
    /// # Errors
    ///
    /// [`DeviceError::InvalidArgument`] when the program names no active
    /// preset, otherwise as for [`Self::current_preset`] and
    /// [`Self::save_preset`].
    pub fn save_current_preset(&self) -> Result<String> {
        let name = self.current_preset()?;
        if name.trim().is_empty() {
            return Err(DeviceError::InvalidArgument("no active preset to save".to_string()));
        }
        self.save_preset(&name)?;
        Ok(name)
    }

    /// Delete a stored preset.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_parameter`].
    pub fn delete_preset(&self, name: &str) -> Result<()> {
        require_name("preset", name)?;
        self.command("DeletePreset", &[name])
    }

    /// Replace the plugins of a chain. Blank plugin names are dropped.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_parameter`].
    pub fn set_chain<S: AsRef<str>>(&self, chain: &str, plugins: &[S]) -> Result<()> {
        require_name("chain", chain)?;
        let mut args = vec![chain];
        args.extend(
            plugins
                .iter()
                .map(|p| p.as_ref().trim())
                .filter(|p| !p.is_empty()),
        );
        self.command("SetChain", &args)
    }

    /// Unload a plugin instance.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_parameter`].
    pub fn release_plugin(&self, plugin: &str) -> Result<()> {
        require_name("plugin", plugin)?;
        self.command("ReleasePlugin", &[plugin])
    }

    /// Bypass or engage a plugin instance.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_parameter`].
    pub fn set_plugin_enabled(&self, plugin: &str, enabled: bool) -> Result<()> {
        self.set_parameter(plugin, ENABLED_PARAM, if enabled { "1" } else { "0" })
    }

    /// Set a file-valued parameter after checking it against a fresh
    /// configuration dump.
    ///
    /// The plugin type is looked up from the instance name (`NAM_1` is a
    /// `NAM`). The parameter must be of type `File`, and when the dump lists
    /// choices for it, `value` must be one of them.
    ///
    /// # Errors
    ///
    /// [`DeviceError::InvalidArgument`] when validation fails, otherwise as
    /// for [`Self::dump_configuration`] and [`Self::set_parameter`].
    pub fn set_file_parameter(&self, instance: &str, param: &str, value: &str) -> Result<()> {
        require_name("plugin", instance)?;
        require_name("param", param)?;
        if value.is_empty() {
            return Err(DeviceError::InvalidArgument("empty file value".to_string()));
        }

        let catalog = self.dump_configuration_parsed()?;
        let plugin = catalog.plugin_for_instance(instance).ok_or_else(|| {
            DeviceError::InvalidArgument(format!("unknown plugin: {instance}"))
        })?;
        let def = plugin.params.get(param).ok_or_else(|| {
            DeviceError::InvalidArgument(format!("unknown param for plugin: {instance}.{param}"))
        })?;
        if def.param_type != FILE_PARAM_TYPE {
            return Err(DeviceError::InvalidArgument(format!(
                "param is not a File type: {instance}.{param}"
            )));
        }
        if let Some(tree) = plugin.file_trees.get(param) {
            if !tree.contains(value) {
                return Err(DeviceError::InvalidArgument(format!(
                    "value not present in file tree: {value}"
                )));
            }
        }

        self.set_parameter(instance, param, value)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Send `verb args...` and wait for the acknowledgment.
    fn command(&self, verb: &str, args: &[&str]) -> Result<()> {
        if let Some(arg) = args.iter().find(|arg| breaks_line(arg)) {
            return Err(DeviceError::InvalidArgument(format!(
                "{verb} argument contains a line break: {arg:?}"
            )));
        }
        self.run(&command_line(verb, args), Termination::Ack).map(|_| ())
    }

    /// One exchange plus the error-line scan.
    fn run(&self, command: &str, termination: Termination) -> Result<String> {
        let raw = self
            .channel
            .exchange(command, |line, state| termination.is_complete(line, state))?;

        if let Some(line) = first_protocol_error(&raw) {
            log::warn!(
                "[Client] {} rejected {:?}: {line}",
                self.channel.addr(),
                command.trim_end()
            );
            return Err(DeviceError::ProtocolError {
                line: line.to_string(),
            });
        }
        Ok(raw)
    }
}

/// First trimmed line starting with the `Error` marker as a whole word.
fn first_protocol_error(raw: &str) -> Option<&str> {
    raw.lines().map(str::trim).find(|line| {
        line.strip_prefix(ERROR_MARKER)
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
    })
}

fn require_name(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeviceError::InvalidArgument(format!("empty {what} name")));
    }
    Ok(())
}

/// Check that a user-supplied preset name is safe to use as a file name on
/// the device.
///
/// Leading and trailing whitespace is ignored. Rejects empty names, path
/// separators, `..`, control characters, and names over 200 bytes.
///
/// # Errors
///
/// [`DeviceError::InvalidArgument`] describing the first problem found.
pub fn validate_preset_name(name: &str) -> Result<()> {
    let name = name.trim();
    let reason = if name.is_empty() {
        "empty"
    } else if name.contains(['/', '\\']) || name.contains("..") {
        "path separators not allowed"
    } else if name.chars().any(char::is_control) {
        "control chars not allowed"
    } else if name.len() > MAX_PRESET_NAME_LEN {
        "too long"
    } else {
        return Ok(());
    };
    Err(DeviceError::InvalidArgument(format!(
        "invalid preset name {name:?}: {reason}"
    )))
}
