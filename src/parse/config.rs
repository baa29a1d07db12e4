//! Configuration dump parser.
//!
//! `Dump Config` describes every plugin type the device knows:
//!
//! ```text
//! PluginConfig Amp BackgroundColor #202020 IsUserSelectable 1 Description "Amp sim"
//! ParameterConfig Amp Gain Type Knob MinValue 0 MaxValue 10 DefaultValue 5
//! ParameterConfig Drive Type Knob MinValue 0 MaxValue 1
//! ParameterFileTree NAM Model NamModels "Clean.nam" "Crunch.nam"
//! EndConfig
//! Ok
//! ```
//!
//! The device does not always emit this consistently (the third line omits
//! its plugin name), so parsing is best-effort: lines that cannot be
//! attributed are skipped and the parse itself never fails.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::constants::{
    ACK_LINE, END_CONFIG, PARAMETER_CONFIG, PARAMETER_FILE_TREE, PARAM_TYPE_KEY, PLUGIN_CONFIG,
};
use crate::protocol::decode_line;

/// Plugin catalog built from a configuration dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    /// Plugin type name to definition.
    pub plugins: BTreeMap<String, PluginDef>,
    /// Plugin names in the order the dump first mentioned them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<String>,
}

impl Catalog {
    /// Look up a plugin type by name.
    pub fn plugin(&self, name: &str) -> Option<&PluginDef> {
        self.plugins.get(name)
    }

    /// Look up the plugin type of a running instance.
    ///
    /// Instances are named after their type with an optional `_<digits>`
    /// suffix (`ConvoReverb_2` is a `ConvoReverb`). The exact name is tried
    /// first.
    pub fn plugin_for_instance(&self, instance: &str) -> Option<&PluginDef> {
        self.plugins
            .get(instance)
            .or_else(|| self.plugins.get(instance_base_name(instance)))
    }

    fn ensure_plugin(&mut self, name: &str) -> &mut PluginDef {
        if !self.plugins.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.plugins
            .entry(name.to_string())
            .or_insert_with(|| PluginDef::new(name))
    }
}

/// Strip a trailing `_<digits>` instance suffix.
pub fn instance_base_name(instance: &str) -> &str {
    match instance.rsplit_once('_') {
        Some((base, suffix))
            if !base.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => instance,
    }
}

/// One plugin type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDef {
    /// Plugin type name.
    pub name: String,
    /// Display background color, e.g. `#202020`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub background_color: String,
    /// Display foreground color.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub foreground_color: String,
    /// Whether users may add this plugin to a chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_user_selectable: Option<bool>,
    /// Free-text description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Parameter name to definition.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamDef>,
    /// Parameter name to file choices, for file-valued parameters.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub file_trees: BTreeMap<String, FileTreeDef>,
}

impl PluginDef {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn apply(&mut self, pairs: &[String]) {
        for pair in pairs.chunks_exact(2) {
            let (key, value) = (pair[0].as_str(), &pair[1]);
            match key {
                "BackgroundColor" => self.background_color.clone_from(value),
                "ForegroundColor" => self.foreground_color.clone_from(value),
                "IsUserSelectable" => self.is_user_selectable = Some(parse_flag(value)),
                "Description" => self.description.clone_from(value),
                _ => {}
            }
        }
    }
}

/// One parameter of a plugin type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDef {
    /// Owning plugin type.
    pub plugin: String,
    /// Parameter name.
    pub name: String,
    /// Control type tag (`Knob`, `Toggle`, `File`, ...).
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub param_type: String,
    /// Lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Value on plugin creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<f64>,
    /// Exponent of the control's response curve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_power: Option<f64>,
    /// Display format hint.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value_format: String,
    /// Whether the value can follow the host tempo.
    #[serde(rename = "canSyncToHostBPM", skip_serializing_if = "Option::is_none")]
    pub can_sync_to_host_bpm: Option<bool>,
    /// Hidden behind an "advanced" toggle in UIs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_advanced: Option<bool>,
    /// Read-only meter rather than a control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_output: Option<bool>,
    /// Free-text description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Keys the parser does not model, kept verbatim.
    #[serde(rename = "rawKV", skip_serializing_if = "BTreeMap::is_empty")]
    pub raw_kv: BTreeMap<String, String>,
}

impl ParamDef {
    fn new(plugin: &str, name: &str, pairs: &[String]) -> Self {
        let mut def = Self {
            plugin: plugin.to_string(),
            name: name.to_string(),
            ..Self::default()
        };
        for pair in pairs.chunks_exact(2) {
            let (key, value) = (pair[0].as_str(), &pair[1]);
            match key {
                PARAM_TYPE_KEY => def.param_type.clone_from(value),
                "MinValue" => def.min_value = value.parse().ok(),
                "MaxValue" => def.max_value = value.parse().ok(),
                "DefaultValue" => def.default_value = value.parse().ok(),
                "RangePower" => def.range_power = value.parse().ok(),
                "ValueFormat" => def.value_format.clone_from(value),
                "CanSyncToHostBPM" => def.can_sync_to_host_bpm = Some(parse_flag(value)),
                "IsAdvanced" => def.is_advanced = Some(parse_flag(value)),
                "IsOutput" => def.is_output = Some(parse_flag(value)),
                "Description" => def.description.clone_from(value),
                _ => {
                    def.raw_kv.insert(key.to_string(), value.clone());
                }
            }
        }
        def
    }
}

/// Label/value choice derived from a file tree item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOption {
    /// Text shown to the user.
    pub label: String,
    /// Value sent to the device.
    pub value: String,
}

/// Choices for a file-valued parameter.
///
/// `items` and `options` are built together and stay in lock-step: every
/// option is the projection of the item at the same index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTreeDef {
    /// Owning plugin type.
    pub plugin: String,
    /// File-valued parameter name.
    pub param: String,
    /// Category label, e.g. the model folder.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
    items: Vec<String>,
    options: Vec<FileOption>,
}

impl FileTreeDef {
    /// Build a tree; options are generated from `items`.
    pub fn new(plugin: &str, param: &str, category: &str, items: Vec<String>) -> Self {
        let options = items
            .iter()
            .map(|item| FileOption {
                label: item.clone(),
                value: item.clone(),
            })
            .collect();
        Self {
            plugin: plugin.to_string(),
            param: param.to_string(),
            category: category.to_string(),
            items,
            options,
        }
    }

    /// Raw item strings in dump order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Label/value view of [`Self::items`].
    pub fn options(&self) -> &[FileOption] {
        &self.options
    }

    /// Returns `true` if `value` is one of the tree's choices.
    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|item| item == value)
    }
}

/// Recognized shapes of a configuration dump line.
#[derive(Debug, PartialEq)]
enum ConfigDirective<'a> {
    Plugin {
        name: &'a str,
        pairs: &'a [String],
    },
    Parameter {
        /// `None` when the line omitted the plugin name.
        plugin: Option<&'a str>,
        param: &'a str,
        pairs: &'a [String],
    },
    FileTree {
        plugin: &'a str,
        param: &'a str,
        category: &'a str,
        items: &'a [String],
    },
    Ignored,
}

impl<'a> ConfigDirective<'a> {
    fn decode(tokens: &'a [String]) -> Self {
        let Some((keyword, rest)) = tokens.split_first() else {
            return Self::Ignored;
        };
        match (keyword.as_str(), rest) {
            (PLUGIN_CONFIG, [name, pairs @ ..]) => Self::Plugin { name, pairs },
            (PARAMETER_CONFIG, [first, second, more @ ..]) => {
                Self::decode_parameter(first, second, more, &rest[1..])
            }
            (PARAMETER_FILE_TREE, [plugin, param, category, items @ ..]) => Self::FileTree {
                plugin,
                param,
                category,
                items,
            },
            _ => Self::Ignored,
        }
    }

    /// `ParameterConfig <plugin> <param> Type ...` or, when the plugin name
    /// was dropped, `ParameterConfig <param> Type ...`.
    fn decode_parameter(
        first: &'a str,
        second: &'a str,
        more: &'a [String],
        after_first: &'a [String],
    ) -> Self {
        if first == PARAM_TYPE_KEY {
            // No name precedes the key/value section at all.
            return Self::Ignored;
        }
        let explicit = more.first().is_some_and(|key| key == PARAM_TYPE_KEY);
        if second == PARAM_TYPE_KEY && !explicit {
            return Self::Parameter {
                plugin: None,
                param: first,
                pairs: after_first,
            };
        }
        Self::Parameter {
            plugin: Some(first),
            param: second,
            pairs: more,
        }
    }
}

/// Rolling context threaded through one parse.
#[derive(Debug, Default)]
struct ParserState {
    /// Last plugin named by a `PluginConfig` or `ParameterFileTree` line.
    current_plugin: Option<String>,
}

impl ParserState {
    fn apply(&mut self, catalog: &mut Catalog, directive: ConfigDirective<'_>, line: &str) {
        match directive {
            ConfigDirective::Plugin { name, pairs } => {
                self.current_plugin = Some(name.to_string());
                catalog.ensure_plugin(name).apply(pairs);
            }
            ConfigDirective::Parameter {
                plugin,
                param,
                pairs,
            } => {
                let Some(owner) = plugin.or(self.current_plugin.as_deref()) else {
                    log::warn!("[Config] No plugin to attach parameter line to: {line:?}");
                    return;
                };
                let def = ParamDef::new(owner, param, pairs);
                catalog
                    .ensure_plugin(owner)
                    .params
                    .insert(param.to_string(), def);
            }
            ConfigDirective::FileTree {
                plugin,
                param,
                category,
                items,
            } => {
                self.current_plugin = Some(plugin.to_string());
                let tree = FileTreeDef::new(plugin, param, category, items.to_vec());
                catalog
                    .ensure_plugin(plugin)
                    .file_trees
                    .insert(param.to_string(), tree);
            }
            ConfigDirective::Ignored => {}
        }
    }
}

/// Parse the raw text of a `Dump Config` response.
///
/// Parsing stops at the first bare `Ok`. Malformed lines are skipped.
pub fn parse_config(raw: &str) -> Catalog {
    let mut catalog = Catalog::default();
    let mut state = ParserState::default();

    for line in raw.lines().map(str::trim) {
        if line.is_empty() || line == END_CONFIG {
            continue;
        }
        if line == ACK_LINE {
            break;
        }
        let tokens = decode_line(line);
        let directive = ConfigDirective::decode(&tokens);
        state.apply(&mut catalog, directive, line);
    }

    catalog
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "True")
}
