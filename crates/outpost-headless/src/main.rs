//! The binary entry point for the headless Outpost client.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use outpost_client::memory::{EntityMap, ScriptedPlayer, StaticIdentity, SystemClock, TileGrid, standard_types};
use outpost_client::{Collaborators, NetClient};
use outpost_config::{CliArgs, Config, default_config_dir};
use outpost_headless::GAME_VERSION;
use outpost_headless::game_loop::GameLoop;
use outpost_headless::session::{Control, Session};
use outpost_log::init_logging;
use outpost_net::LinkConfig;

fn load_config(args: &CliArgs) -> (Config, Option<PathBuf>) {
    let config_dir = args.config.clone().or_else(default_config_dir);
    let mut config = match config_dir.as_deref() {
        Some(dir) => Config::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config from {}: {e}", dir.display());
            Config::default()
        }),
        None => Config::default(),
    };
    config.apply_cli_overrides(args);
    (config, config_dir)
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let (config, config_dir) = load_config(&args);
    let log_dir = config_dir.as_ref().map(|dir| dir.join("logs"));
    init_logging(log_dir.as_deref(), config.debug.json_log, Some(&config));

    let collab = Collaborators {
        entities: Box::new(EntityMap::new()),
        world: Box::new(TileGrid::new()),
        player: Box::new(ScriptedPlayer::default()),
        identity: Box::new(StaticIdentity::from_config(&config.identity, GAME_VERSION)),
        clock: Box::new(SystemClock),
    };
    let client = match NetClient::new(&config, standard_types(), collab) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build procedure table: {e}");
            std::process::exit(1);
        }
    };

    let mut session = Session::new(client, LinkConfig::default());
    session
        .client_mut()
        .connect(&config.network.server_address, config.network.server_port);

    let mut game_loop = GameLoop::new(config.network.tick_rate);
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(game_loop.fixed_dt()));
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.pump_events().await;
                let client = session.client_mut();
                game_loop.tick(|ticks| client.update(ticks));
                session.execute_commands().await;
                session.report_events();
            }
            line = input.next_line(), if input_open => match line {
                Ok(Some(line)) => {
                    if session.handle_input(&line) == Control::Quit {
                        break;
                    }
                }
                Ok(None) | Err(_) => input_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down");
    session.shutdown().await;
}
