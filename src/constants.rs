//! Protocol keywords and connection defaults for the Stompbox bridge.
//!
//! This module centralizes the literal tokens the device speaks and the
//! default limits applied to every exchange, so the codec, parsers and
//! client agree on a single spelling.
//!
//! # Categories
//!
//! - **Timeouts**: dial, write and per-read deadlines
//! - **Limits**: response size cap
//! - **Framing**: acknowledgment, error and phase-end markers
//! - **Directives**: first-token keywords of the two dump grammars

use std::time::Duration;

// ============================================================================
// Timeouts
// ============================================================================

/// Default time allowed for the TCP dial to the device.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Default deadline applied to each individual read.
///
/// The deadline covers one read, not the whole exchange: a large dump that
/// keeps streaming is never cut off, only a read that stalls.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for writing the command line.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Limits
// ============================================================================

/// Default cap on the accumulated size of one response, in bytes.
pub const DEFAULT_MAX_BYTES: usize = 2_000_000;

// ============================================================================
// Framing
// ============================================================================

/// Line terminator expected on every command.
pub const CRLF: &str = "\r\n";

/// Bare acknowledgment line ending most responses.
pub const ACK_LINE: &str = "Ok";

/// Prefix of an embedded protocol error line.
pub const ERROR_MARKER: &str = "Error";

/// Phase-end marker of a configuration dump.
pub const END_CONFIG: &str = "EndConfig";

/// Phase-end marker of a program dump.
pub const END_PROGRAM: &str = "EndProgram";

// ============================================================================
// Directives
// ============================================================================

/// Configuration dump: plugin header.
pub const PLUGIN_CONFIG: &str = "PluginConfig";

/// Configuration dump: parameter definition.
pub const PARAMETER_CONFIG: &str = "ParameterConfig";

/// Configuration dump: file-valued parameter choices.
pub const PARAMETER_FILE_TREE: &str = "ParameterFileTree";

/// Key that opens the key/value section of a `ParameterConfig` line.
pub const PARAM_TYPE_KEY: &str = "Type";

/// Program dump: active preset.
pub const SET_PRESET: &str = "SetPreset";

/// Program dump: chain contents.
pub const SET_CHAIN: &str = "SetChain";

/// Program dump: slot binding.
pub const SET_PLUGIN_SLOT: &str = "SetPluginSlot";

/// Program dump and command verb: parameter value.
pub const SET_PARAM: &str = "SetParam";

/// Header token of a `List Presets` response.
pub const PRESETS_HEADER: &str = "Presets";

/// Parameter type tag of file-valued parameters.
pub const FILE_PARAM_TYPE: &str = "File";

/// Parameter toggled by [`crate::client::DeviceClient::set_plugin_enabled`].
pub const ENABLED_PARAM: &str = "Enabled";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_timeout_outlasts_dial() {
        assert!(DEFAULT_READ_TIMEOUT > DEFAULT_DIAL_TIMEOUT);
    }

    #[test]
    fn test_markers_are_distinct() {
        assert_ne!(END_CONFIG, END_PROGRAM);
        assert_ne!(END_CONFIG, ACK_LINE);
        assert_ne!(END_PROGRAM, ACK_LINE);
    }
}
