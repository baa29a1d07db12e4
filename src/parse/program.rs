//! Program dump parser.
//!
//! `Dump Program` describes the live state of the device:
//!
//! ```text
//! SetPreset Clean Lead
//! SetChain Lead NoiseGate_2 Delay
//! SetPluginSlot Amp NAM_1
//! SetParam NoiseGate_2 Threshold -40
//! EndProgram
//! Ok
//! ```
//!
//! Unlike the configuration parser this one is strict: a chain, slot or
//! parameter directive missing its required tokens fails the whole parse
//! with [`DeviceError::MalformedDirective`], so corrupted live state is
//! surfaced instead of silently dropped.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::{
    ACK_LINE, END_PROGRAM, SET_CHAIN, SET_PARAM, SET_PLUGIN_SLOT, SET_PRESET,
};
use crate::error::{DeviceError, Result};

/// Live program state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramState {
    /// Name of the active preset; empty when the dump names none.
    pub active_preset: String,
    /// Chain name to ordered plugin instance names.
    pub chains: BTreeMap<String, Vec<String>>,
    /// Slot name to plugin instance name.
    pub slots: BTreeMap<String, String>,
    /// Plugin instance to parameter name to value.
    pub params: BTreeMap<String, BTreeMap<String, String>>,
}

impl ProgramState {
    /// Value of one parameter, if the dump set it.
    pub fn param(&self, plugin: &str, param: &str) -> Option<&str> {
        self.params
            .get(plugin)
            .and_then(|values| values.get(param))
            .map(String::as_str)
    }
}

/// Recognized shapes of a program dump line.
#[derive(Debug, PartialEq, Eq)]
enum ProgramDirective<'a> {
    /// `SetPreset` with no name leaves the active preset untouched.
    Preset(Option<String>),
    Chain {
        name: &'a str,
        plugins: &'a [&'a str],
    },
    Slot {
        slot: &'a str,
        plugin: &'a str,
    },
    Param {
        plugin: &'a str,
        param: &'a str,
        value: String,
    },
    Ignored,
}

impl<'a> ProgramDirective<'a> {
    fn decode(fields: &'a [&'a str], line: &str) -> Result<Self> {
        let Some((&keyword, rest)) = fields.split_first() else {
            return Ok(Self::Ignored);
        };
        let malformed = |directive| DeviceError::MalformedDirective {
            directive,
            line: line.to_string(),
        };

        let directive = match keyword {
            SET_PRESET => Self::Preset((!rest.is_empty()).then(|| rest.join(" "))),
            SET_CHAIN => match rest {
                [name, plugins @ ..] => Self::Chain { name, plugins },
                [] => return Err(malformed(SET_CHAIN)),
            },
            SET_PLUGIN_SLOT => match rest {
                [slot, plugin, ..] => Self::Slot { slot, plugin },
                _ => return Err(malformed(SET_PLUGIN_SLOT)),
            },
            SET_PARAM => match rest {
                [plugin, param, value @ ..] => Self::Param {
                    plugin,
                    param,
                    value: value.join(" "),
                },
                _ => return Err(malformed(SET_PARAM)),
            },
            _ => Self::Ignored,
        };
        Ok(directive)
    }

    fn apply(self, state: &mut ProgramState) {
        match self {
            Self::Preset(Some(name)) => state.active_preset = name,
            Self::Preset(None) | Self::Ignored => {}
            Self::Chain { name, plugins } => {
                let plugins = plugins.iter().map(|p| (*p).to_string()).collect();
                state.chains.insert(name.to_string(), plugins);
            }
            Self::Slot { slot, plugin } => {
                state.slots.insert(slot.to_string(), plugin.to_string());
            }
            Self::Param {
                plugin,
                param,
                value,
            } => {
                state
                    .params
                    .entry(plugin.to_string())
                    .or_default()
                    .insert(param.to_string(), value);
            }
        }
    }
}

/// Parse the raw text of a `Dump Program` response.
///
/// `EndProgram` and `Ok` lines are skipped, not treated as the end.
///
/// # Errors
///
/// Returns [`DeviceError::MalformedDirective`] for a `SetChain` without a
/// chain name, or a `SetPluginSlot` / `SetParam` with fewer than two
/// arguments.
pub fn parse_program(raw: &str) -> Result<ProgramState> {
    let mut state = ProgramState::default();

    for line in raw.lines().map(str::trim) {
        if line.is_empty() || line == END_PROGRAM || line == ACK_LINE {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        ProgramDirective::decode(&fields, line)?.apply(&mut state);
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = concat!(
        "SetPreset Clean Lead\r\n",
        "SetChain Lead NoiseGate_2 Delay\r\n",
        "SetChain Input\r\n",
        "SetPluginSlot Amp NAM_1\r\n",
        "SetParam NoiseGate_2 Threshold -40\r\n",
        "SetParam Delay Mode ping  pong\r\n",
        "SetParam Delay Tempo\r\n",
        "EndProgram\r\n",
        "Ok\r\n",
    );

    #[test]
    fn test_chain_and_param() {
        let state =
            parse_program("SetChain Lead NoiseGate_2 Delay\nSetParam NoiseGate_2 Threshold -40\n")
                .unwrap();
        assert_eq!(state.chains["Lead"], vec!["NoiseGate_2", "Delay"]);
        assert_eq!(state.params["NoiseGate_2"]["Threshold"], "-40");
    }

    #[test]
    fn test_full_dump() {
        let state = parse_program(DUMP).unwrap();
        assert_eq!(state.active_preset, "Clean Lead");
        assert_eq!(state.slots["Amp"], "NAM_1");
        assert_eq!(state.param("Delay", "Mode"), Some("ping pong"));
        assert_eq!(state.param("Delay", "Tempo"), Some(""));
        assert_eq!(state.param("Delay", "Missing"), None);
    }

    #[test]
    fn test_chain_without_plugins_is_empty_sequence() {
        let state = parse_program("SetChain Lead\n").unwrap();
        assert_eq!(state.chains.get("Lead"), Some(&Vec::new()));
    }

    #[test]
    fn test_chain_without_name_is_malformed() {
        let err = parse_program("SetPreset A\nSetChain\n").unwrap_err();
        assert!(matches!(
            err,
            DeviceError::MalformedDirective { directive: "SetChain", ref line }
                if line == "SetChain"
        ));
    }

    #[test]
    fn test_short_slot_is_malformed() {
        let err = parse_program("SetPluginSlot Amp\n").unwrap_err();
        assert!(matches!(
            err,
            DeviceError::MalformedDirective { directive: "SetPluginSlot", .. }
        ));
    }

    #[test]
    fn test_short_param_is_malformed() {
        let err = parse_program("SetParam Amp\n").unwrap_err();
        assert!(matches!(err, DeviceError::MalformedDirective { directive: "SetParam", .. }));
        assert_eq!(err.to_string(), "malformed SetParam: \"SetParam Amp\"");
    }

    #[test]
    fn test_bare_set_preset_keeps_previous() {
        let state = parse_program("SetPreset Crunch\nSetPreset\n").unwrap();
        assert_eq!(state.active_preset, "Crunch");
        assert_eq!(parse_program("SetPreset\n").unwrap().active_preset, "");
    }

    #[test]
    fn test_later_param_overwrites() {
        let state = parse_program("SetParam Amp Gain 1\nSetParam Amp Gain 2\n").unwrap();
        assert_eq!(state.param("Amp", "Gain"), Some("2"));
    }

    #[test]
    fn test_markers_do_not_stop_parsing() {
        let state = parse_program("Ok\nEndProgram\nSetPreset After\n").unwrap();
        assert_eq!(state.active_preset, "After");
    }

    #[test]
    fn test_unknown_directives_ignored() {
        let state = parse_program("Unknown thing\nSetMidi 1 2\n").unwrap();
        assert_eq!(state, ProgramState::default());
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse_program(DUMP).unwrap(), parse_program(DUMP).unwrap());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(parse_program(DUMP).unwrap()).unwrap();
        assert_eq!(json["activePreset"], "Clean Lead");
        assert_eq!(json["chains"]["Input"], serde_json::json!([]));
    }
}
