//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Connection and timing settings.
    pub network: NetworkConfig,
    /// Chat formatting and server-side chat limits.
    pub chat: ChatConfig,
    /// Local player identity sent in the handshake.
    pub identity: IdentityConfig,
    /// Per-host rewriting rules applied to the handshake.
    pub hosts: Vec<HostGroup>,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Connection and timing configuration. All periods are in simulation ticks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Server address.
    pub server_address: String,
    /// Server port.
    pub server_port: u16,
    /// Ticks to wait for world data before giving up.
    pub data_timeout_ticks: u32,
    /// Ticks between client state snapshots.
    pub player_sync_ticks: u32,
    /// Ticks between latency probes.
    pub ping_ticks: u32,
    /// Simulation tick rate (Hz).
    pub tick_rate: u32,
    /// Largest accepted world download after decompression, in bytes.
    pub max_world_bytes: usize,
}

/// Chat configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
    /// Messages a sender may submit within one rate window.
    pub rate_limit_messages: u32,
    /// Length of the rate window in milliseconds.
    pub rate_limit_window_ms: u64,
    /// Messages from connections younger than this are dropped.
    pub min_connection_age_ms: u64,
    /// How long a flooding address stays blacklisted.
    pub blacklist_seconds: u64,
    /// World units per tile, used to turn chat coordinates into positions.
    pub tile_size: f32,
    /// Prefix that marks a message as a command.
    pub command_prefix: String,
}

/// Identity of the local player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Display name, possibly with color tags.
    pub name: String,
    /// Player color as RGBA8888.
    pub color: u32,
    /// Locale tag, or `"default"` to use the system locale.
    pub locale: String,
    /// Whether to announce a mobile client.
    pub mobile: bool,
}

/// How the handshake name and color are rewritten for a group of hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HostPolicy {
    /// Send the handshake unchanged.
    None,
    /// Remove a leading `[color]` tag from the name and send that color
    /// instead of the configured one.
    StripColorTag,
    /// Replace any color not in `palette` with `fallback`.
    RestrictColor { palette: Vec<u32>, fallback: u32 },
}

/// A named set of host addresses sharing one [`HostPolicy`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostGroup {
    /// Group name, for logs.
    pub name: String,
    /// Bare host addresses (no port) belonging to the group.
    pub addresses: Vec<String>,
    /// Rewriting rule for these hosts.
    pub policy: HostPolicy,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write a JSON log file next to the console output.
    pub json_log: bool,
}

// --- Default implementations ---

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 6567,
            data_timeout_ticks: 60 * 30,
            player_sync_ticks: 4,
            ping_ticks: 60,
            tick_rate: 60,
            max_world_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 150,
            rate_limit_messages: 5,
            rate_limit_window_ms: 2_000,
            min_connection_age_ms: 500,
            blacklist_seconds: 60,
            tile_size: 8.0,
            command_prefix: "/".to_string(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "player".to_string(),
            color: 0xffd37fff,
            locale: "default".to_string(),
            mobile: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_log: false,
        }
    }
}

impl HostGroup {
    /// Returns `true` if `host` belongs to this group.
    pub fn contains(&self, host: &str) -> bool {
        self.addresses.iter().any(|a| a == host)
    }
}

/// Platform config directory for the client (`<config dir>/outpost`).
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("outpost"))
}

// --- Load / Save / Reload ---

/// File name inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

impl Config {
    /// Load `config.ron` from `config_dir`, writing the defaults there first
    /// if the file does not exist yet.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Wrote default client config to {}", path.display());
            return Ok(config);
        }
        let config = Self::read(&path)?;
        log::info!("Client config loaded from {}", path.display());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write `config.ron` into `config_dir`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_err)?;

        // Host groups nest four levels deep.
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let text = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(&path, text).map_err(write_err)
    }

    /// Re-read `config.ron`. Returns `Some` only if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&config_dir.join(CONFIG_FILE))?;
        if fresh == *self {
            return Ok(None);
        }
        log::info!("Client config changed on disk");
        Ok(Some(fresh))
    }

    /// The host group `host` belongs to, if any. First match wins.
    pub fn host_group(&self, host: &str) -> Option<&HostGroup> {
        self.hosts.iter().find(|g| g.contains(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_groups() -> Vec<HostGroup> {
        vec![
            HostGroup {
                name: "tagged".to_string(),
                addresses: vec!["10.0.0.5".to_string()],
                policy: HostPolicy::StripColorTag,
            },
            HostGroup {
                name: "palette".to_string(),
                addresses: vec!["10.0.0.6".to_string(), "10.0.0.7".to_string()],
                policy: HostPolicy::RestrictColor {
                    palette: vec![0xff0000ff, 0x00ff00ff],
                    fallback: 0xff0000ff,
                },
            },
        ]
    }

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("data_timeout_ticks: 1800"));
        assert!(ron_str.contains("player_sync_ticks: 4"));
        assert!(ron_str.contains("max_message_length: 150"));
    }

    #[test]
    fn test_config_roundtrip_with_host_groups() {
        let config = Config {
            hosts: sample_groups(),
            ..Config::default()
        };
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(network: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.chat, ChatConfig::default());
        assert!(config.hosts.is_empty());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_host_group_lookup() {
        let config = Config {
            hosts: sample_groups(),
            ..Config::default()
        };
        assert_eq!(config.host_group("10.0.0.7").unwrap().name, "palette");
        assert_eq!(config.host_group("10.0.0.5").unwrap().name, "tagged");
        assert!(config.host_group("10.0.0.8").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.network.server_address = "10.0.0.1".to_string();
        config.identity.name = "[scarlet]tester".to_string();
        config.hosts = sample_groups();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.chat.tile_size = 16.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().chat.tile_size, 16.0);
        assert!(modified.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
