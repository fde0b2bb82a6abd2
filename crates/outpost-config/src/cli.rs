//! Command-line overrides.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Flags for the headless client. Anything given here wins over `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "outpost", about = "Headless Outpost client")]
pub struct CliArgs {
    /// Host to join.
    #[arg(long)]
    pub server: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Display name sent in the handshake. May carry color tags.
    #[arg(long)]
    pub name: Option<String>,

    /// Locale sent in the handshake, e.g. `en` or `pt_BR`.
    #[arg(long)]
    pub locale: Option<String>,

    /// Tracing filter, e.g. `debug` or `info,outpost_net=trace`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write JSON records to `logs/outpost.log`.
    #[arg(long)]
    pub json_log: bool,

    /// Directory holding `config.ron`.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Overlay the flags that were given on the command line.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let network = &mut self.network;
        if let Some(server) = &args.server {
            network.server_address.clone_from(server);
        }
        if let Some(port) = args.port {
            network.server_port = port;
        }

        let identity = &mut self.identity;
        if let Some(name) = &args.name {
            identity.name.clone_from(name);
        }
        if let Some(locale) = &args.locale {
            identity.locale.clone_from(locale);
        }

        if let Some(level) = &args.log_level {
            self.debug.log_level.clone_from(level);
        }
        self.debug.json_log |= args.json_log;
    }
}
