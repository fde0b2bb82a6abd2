//! Configuration for the Outpost client.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Every section tolerates missing or unknown fields so older
//! and newer config files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE, ChatConfig, Config, DebugConfig, HostGroup, HostPolicy, IdentityConfig, NetworkConfig,
    default_config_dir,
};
pub use error::ConfigError;
