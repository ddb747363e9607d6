//! Client configuration.
//!
//! Defaults match the simulator's stock `broadcasting.json` (port 9000, empty
//! passwords) and the update cadence most overlays use.

use std::path::Path;
use std::time::Duration;

use acc_broadcast_protocol::DEFAULT_BROADCAST_PORT;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Smallest datagram the simulator sends is a bare entry list.
const MIN_RECEIVE_BUFFER: usize = 64;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("broadcasting.json is not valid UTF-8 or UTF-16")]
    Encoding,
}

impl ConfigError {
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Connection settings for one broadcasting client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host:port` of the simulator's broadcasting listener.
    pub address: String,
    /// Name shown in the simulator's broadcasting client list.
    pub display_name: String,
    pub connection_password: String,
    /// Empty means read-only.
    pub command_password: String,
    /// Requested realtime update cadence.
    pub update_interval_ms: i32,
    /// Bound applied to every socket read and write.
    pub timeout_ms: u64,
    /// Pause between a failed attempt and the next one.
    pub reconnect_delay_ms: u64,
    pub receive_buffer_size: usize,
    /// Minimum spacing between entry-list refresh requests.
    pub entry_list_refresh_interval_ms: u64,
    pub request_entry_list_on_connect: bool,
    pub request_track_data_on_connect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_BROADCAST_PORT}"),
            display_name: "acc-broadcast".to_string(),
            connection_password: "asd".to_string(),
            command_password: String::new(),
            update_interval_ms: 250,
            timeout_ms: 5_000,
            reconnect_delay_ms: 5_000,
            receive_buffer_size: 32 * 1024,
            entry_list_refresh_interval_ms: 1_000,
            request_entry_list_on_connect: true,
            request_track_data_on_connect: true,
        }
    }
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn entry_list_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.entry_list_refresh_interval_ms)
    }

    /// Check the settings before the first connection attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::invalid("address", "must not be empty"));
        }
        if self.update_interval_ms <= 0 {
            return Err(ConfigError::invalid(
                "update_interval_ms",
                format!("must be positive, got {}", self.update_interval_ms),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("timeout_ms", "must be positive"));
        }
        if self.receive_buffer_size < MIN_RECEIVE_BUFFER {
            return Err(ConfigError::invalid(
                "receive_buffer_size",
                format!(
                    "must be at least {MIN_RECEIVE_BUFFER} bytes, got {}",
                    self.receive_buffer_size
                ),
            ));
        }
        for (field, value) in [
            ("display_name", &self.display_name),
            ("connection_password", &self.connection_password),
            ("command_password", &self.command_password),
        ] {
            if i16::try_from(value.len()).is_err() {
                return Err(ConfigError::invalid(
                    field,
                    format!("{} bytes do not fit the i16 length prefix", value.len()),
                ));
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed input.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a YAML or JSON file, chosen by extension (YAML otherwise).
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Take port and passwords from the simulator's own `broadcasting.json`.
    ///
    /// The host part of `address` is kept. Missing keys leave the current
    /// values untouched. Both `updListenerPort` (the simulator's spelling) and
    /// `udpListenerPort` are accepted.
    ///
    /// # Errors
    ///
    /// Fails when the content is not a JSON object.
    pub fn apply_acc_broadcasting_json(&mut self, content: &str) -> Result<(), ConfigError> {
        let object: Map<String, Value> = serde_json::from_str(content)?;

        let port = ["updListenerPort", "udpListenerPort"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_u64))
            .and_then(|port| u16::try_from(port).ok());
        if let Some(port) = port {
            let host = host_part(&self.address).unwrap_or("127.0.0.1");
            self.address = format!("{host}:{port}");
        }

        if let Some(password) = object.get("connectionPassword").and_then(Value::as_str) {
            self.connection_password = password.to_string();
        }
        if let Some(password) = object.get("commandPassword").and_then(Value::as_str) {
            self.command_password = password.to_string();
        }

        debug!(address = %self.address, "applied broadcasting.json");
        Ok(())
    }

    /// Read `broadcasting.json` from disk and apply it.
    ///
    /// The simulator writes this file as UTF-16LE with a byte order mark;
    /// hand-edited UTF-8 copies are accepted too.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, decoded or parsed.
    pub fn apply_acc_broadcasting_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let content = decode_broadcasting_bytes(&bytes)?;
        self.apply_acc_broadcasting_json(&content)
    }
}

fn host_part(address: &str) -> Option<&str> {
    let (host, _) = address.rsplit_once(':')?;
    (!host.is_empty()).then_some(host)
}

fn decode_broadcasting_bytes(bytes: &[u8]) -> Result<String, ConfigError> {
    if let Some(rest) = bytes.strip_prefix(&[0xff, 0xfe]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| match pair {
                [lo, hi] => u16::from_le_bytes([*lo, *hi]),
                _ => 0,
            })
            .collect();
        return String::from_utf16(&units).map_err(|_| ConfigError::Encoding);
    }
    let bytes = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|_| ConfigError::Encoding)
}
