//! Configuration loading.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. A JSON file: the `--config` path, or `<config_dir>/stompbox-bridge/config.json`
//! 3. Environment variables (`STOMPBOX_HOST`, `STOMPBOX_PORT`, `DIAL_TIMEOUT`,
//!    `READ_TIMEOUT`, `MAX_BYTES`)
//!
//! Environment values that fail to parse are ignored with a warning and the
//! previous layer's value stays in effect.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::channel::CommandChannel;
use crate::client::DeviceClient;
use crate::constants::{DEFAULT_DIAL_TIMEOUT, DEFAULT_MAX_BYTES, DEFAULT_READ_TIMEOUT};

/// Directory name under the platform config directory.
const APP_DIR: &str = "stompbox-bridge";

/// Connection settings for the Stompbox bridge.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Device host name or IP.
    pub host: String,
    /// Device control port. Zero means unset.
    pub port: u16,
    /// Dial timeout in milliseconds.
    pub dial_timeout_ms: u64,
    /// Per-read deadline in milliseconds; zero disables it.
    pub read_timeout_ms: u64,
    /// Response size cap in bytes.
    pub max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            dial_timeout_ms: millis(DEFAULT_DIAL_TIMEOUT),
            read_timeout_ms: millis(DEFAULT_READ_TIMEOUT),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    /// Load settings from `path` (or the default location) plus the
    /// environment.
    ///
    /// An explicit `path` must exist. A missing default file just means
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read one JSON config file. Missing keys take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("STOMPBOX_HOST").filter(|h| !h.trim().is_empty()) {
            self.host = host.trim().to_string();
        }

        if let Some(port) = lookup("STOMPBOX_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => log::warn!("[Config] Ignoring STOMPBOX_PORT={port:?}"),
            }
        }

        if let Some(timeout) = lookup("DIAL_TIMEOUT") {
            match parse_duration(&timeout) {
                Some(timeout) => self.dial_timeout_ms = millis(timeout),
                None => log::warn!("[Config] Ignoring DIAL_TIMEOUT={timeout:?}"),
            }
        }

        if let Some(timeout) = lookup("READ_TIMEOUT") {
            match parse_duration(&timeout) {
                Some(timeout) => self.read_timeout_ms = millis(timeout),
                None => log::warn!("[Config] Ignoring READ_TIMEOUT={timeout:?}"),
            }
        }

        if let Some(max_bytes) = lookup("MAX_BYTES") {
            match max_bytes.trim().parse::<usize>() {
                Ok(max) if max > 0 => self.max_bytes = max,
                _ => log::warn!("[Config] Ignoring MAX_BYTES={max_bytes:?}"),
            }
        }
    }

    /// `host:port` of the device.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            // Bare IPv6 literal.
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Override host and port from a `host:port` string.
    pub fn set_address(&mut self, addr: &str) -> Result<()> {
        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("Address {addr:?} is not host:port"))?;
        let port: u16 = port
            .parse()
            .with_context(|| format!("Invalid port in address {addr:?}"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            bail!("Address {addr:?} has no host");
        }
        self.host = host.to_string();
        self.port = port;
        Ok(())
    }

    /// Channel settings for these values.
    pub fn channel(&self) -> CommandChannel {
        CommandChannel::new(self.address())
            .with_dial_timeout(Duration::from_millis(self.dial_timeout_ms))
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
            .with_max_bytes(self.max_bytes)
    }

    /// Client for the configured device.
    ///
    /// Fails when no port has been configured.
    pub fn client(&self) -> Result<DeviceClient> {
        if self.port == 0 {
            bail!("No device port configured (use --addr, STOMPBOX_PORT or \"port\" in config)");
        }
        Ok(DeviceClient::from_channel(self.channel()))
    }
}

/// Parse a duration such as `500ms`, `2s`, `1.5s`, `1m` or `0`.
///
/// Exactly one unit, one of `ms`, `s`, `m` and `h`. Compound values like
/// `1m30s` are rejected. A bare number is only accepted when it is zero.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.parse().ok()?;

    let seconds = match unit {
        "" if value == 0.0 => 0.0,
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(seconds).ok()
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 0);
        assert_eq!(config.dial_timeout_ms, 2_000);
        assert_eq!(config.read_timeout_ms, 10_000);
        assert_eq!(config.max_bytes, 2_000_000);
    }

    #[test]
    fn test_client_requires_port() {
        assert!(Config::default().client().is_err());

        let config = Config {
            port: 5555,
            dial_timeout_ms: 250,
            read_timeout_ms: 0,
            max_bytes: 4096,
            ..Config::default()
        };
        let client = config.client().unwrap();
        let channel = client.channel();
        assert_eq!(channel.addr(), "127.0.0.1:5555");
        assert_eq!(channel.dial_timeout(), Duration::from_millis(250));
        assert_eq!(channel.read_timeout(), Duration::ZERO);
        assert_eq!(channel.max_bytes(), 4096);
    }

    #[test]
    fn test_address_brackets_ipv6() {
        let config = Config {
            host: "::1".to_string(),
            port: 7000,
            ..Config::default()
        };
        assert_eq!(config.address(), "[::1]:7000");
    }

    #[test]
    fn test_set_address() {
        let mut config = Config::default();
        config.set_address("pedal.local:24356").unwrap();
        assert_eq!(config.host, "pedal.local");
        assert_eq!(config.port, 24356);

        config.set_address("[::1]:7000").unwrap();
        assert_eq!(config.address(), "[::1]:7000");

        assert!(config.set_address("pedal.local").is_err());
        assert!(config.set_address("pedal.local:http").is_err());
        assert!(config.set_address(":24356").is_err());
        assert_eq!(config.address(), "[::1]:7000");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("STOMPBOX_HOST", "pedal.local"),
            ("STOMPBOX_PORT", "24356"),
            ("DIAL_TIMEOUT", "500ms"),
            ("READ_TIMEOUT", "1m"),
            ("MAX_BYTES", "1024"),
        ]));
        assert_eq!(config.address(), "pedal.local:24356");
        assert_eq!(config.dial_timeout_ms, 500);
        assert_eq!(config.read_timeout_ms, 60_000);
        assert_eq!(config.max_bytes, 1024);
    }

    #[test]
    fn test_bad_env_values_keep_previous() {
        let mut config = Config {
            port: 9000,
            ..Config::default()
        };
        config.apply_overrides(env(&[
            ("STOMPBOX_HOST", "   "),
            ("STOMPBOX_PORT", "lots"),
            ("DIAL_TIMEOUT", "soon"),
            ("READ_TIMEOUT", "10"),
            ("MAX_BYTES", "0"),
        ]));
        assert_eq!(config, Config { port: 9000, ..Config::default() });
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration(" 1.5s "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("5d"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("-1s"), None);
    }

    #[test]
    fn test_parse_duration_rejects_compound_and_fine_units() {
        assert_eq!(parse_duration("1m30s"), None);
        assert_eq!(parse_duration("1h2m"), None);
        assert_eq!(parse_duration("500us"), None);
        assert_eq!(parse_duration("10ns"), None);
    }

    #[test]
    fn test_load_from_file_fills_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": "10.0.0.7", "port": 24356}}"#).unwrap();

        let config = Config::load_from_file(file.path()).unwrap();

        assert_eq!(config.address(), "10.0.0.7:24356");
        assert_eq!(config.read_timeout_ms, 10_000);
    }

    #[test]
    fn test_load_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(Config::load_from_file(&missing).is_err());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let err = Config::load_from_file(&bad).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config {
            host: "pedal".to_string(),
            port: 1,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"dial_timeout_ms\":2000"));
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
    }
}
