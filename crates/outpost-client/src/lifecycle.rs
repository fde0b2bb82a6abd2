//! Connection state machine.
//!
//! ```text
//! Disconnected -> Connecting -> AwaitingWorld -> Playing -> Disconnected
//!                                   ^                |
//!                                   +-- worldDataBegin
//! ```
//!
//! Every transport-level disconnect funnels into [`ClientCore::on_disconnected`],
//! the only place that tears down session state. Kicks, timeouts and user
//! cancellation only request a disconnect and let that path do the reset.

use outpost_net::{TransportCommand, unpack_world_stream};
use tracing::{debug, error, info, warn};

use crate::client::ClientCore;
use crate::events::{ClientEvent, DisconnectTitle, ErrorNotice, Notice};
use crate::game::GamePhase;
use crate::handshake::build_handshake;
use crate::protocol;

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Transport requested, handshake not yet sent.
    Connecting,
    /// Handshake sent or a new world announced; waiting for world data.
    AwaitingWorld,
    Playing,
}

/// Per-process connection bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    state: ConnectionState,
    /// Suppress disconnect notices.
    pub quiet: bool,
    /// Skip the next disconnect entirely, reset included.
    pub quiet_reset: bool,
    /// Ticks spent waiting in the current state.
    pub timeout_ticks: f32,
    pub last_sent_sequence: i32,
    /// A transport connection is wanted. Cleared by any disconnect request.
    pub link_active: bool,
    /// Set after the first completed world load; never cleared.
    first_load_done: bool,
    last_endpoint: Option<(String, u16)>,
    pending_reconnect: Option<(String, u16)>,
}

impl Connection {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to `to`, restarting the timeout.
    pub fn transition(&mut self, to: ConnectionState) {
        if self.state != to {
            debug!("Connection {:?} -> {:?}", self.state, to);
        }
        self.state = to;
        self.timeout_ticks = 0.0;
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.state, ConnectionState::Connecting | ConnectionState::AwaitingWorld)
    }

    pub fn first_load_done(&self) -> bool {
        self.first_load_done
    }

    /// The endpoint of the most recent connect request.
    pub fn last_endpoint(&self) -> Option<&(String, u16)> {
        self.last_endpoint.as_ref()
    }
}

// ---------------------------------------------------------------------------
// KickReason
// ---------------------------------------------------------------------------

/// Why the server ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KickReason {
    Kick,
    ClientOutdated,
    ServerOutdated,
    Banned,
    GameOver,
    RecentKick,
    NameInUse,
    IdInUse,
    NameEmpty,
    CustomClient,
    ServerClose,
    Vote,
    TypeMismatch,
    Whitelist,
    PlayerLimit,
    ServerRestarting,
}

impl KickReason {
    const ALL: [KickReason; 16] = [
        KickReason::Kick,
        KickReason::ClientOutdated,
        KickReason::ServerOutdated,
        KickReason::Banned,
        KickReason::GameOver,
        KickReason::RecentKick,
        KickReason::NameInUse,
        KickReason::IdInUse,
        KickReason::NameEmpty,
        KickReason::CustomClient,
        KickReason::ServerClose,
        KickReason::Vote,
        KickReason::TypeMismatch,
        KickReason::Whitelist,
        KickReason::PlayerLimit,
        KickReason::ServerRestarting,
    ];

    /// Decode the wire code (declaration order).
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Offer a reconnect button.
    pub fn rejoinable(self) -> bool {
        matches!(
            self,
            KickReason::Kick
                | KickReason::GameOver
                | KickReason::RecentKick
                | KickReason::NameInUse
                | KickReason::ServerClose
                | KickReason::Vote
                | KickReason::PlayerLimit
                | KickReason::ServerRestarting
        )
    }

    /// Show nothing at all.
    pub fn quiet(self) -> bool {
        self == KickReason::GameOver
    }

    /// Message key for the kick dialog.
    pub fn key(self) -> &'static str {
        match self {
            KickReason::Kick => "server.kicked.kick",
            KickReason::ClientOutdated => "server.kicked.clientOutdated",
            KickReason::ServerOutdated => "server.kicked.serverOutdated",
            KickReason::Banned => "server.kicked.banned",
            KickReason::GameOver => "server.kicked.gameover",
            KickReason::RecentKick => "server.kicked.recentKick",
            KickReason::NameInUse => "server.kicked.nameInUse",
            KickReason::IdInUse => "server.kicked.idInUse",
            KickReason::NameEmpty => "server.kicked.nameEmpty",
            KickReason::CustomClient => "server.kicked.customClient",
            KickReason::ServerClose => "server.kicked.serverClose",
            KickReason::Vote => "server.kicked.vote",
            KickReason::TypeMismatch => "server.kicked.typeMismatch",
            KickReason::Whitelist => "server.kicked.whitelist",
            KickReason::PlayerLimit => "server.kicked.playerLimit",
            KickReason::ServerRestarting => "server.kicked.serverRestarting",
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle operations
// ---------------------------------------------------------------------------

impl ClientCore {
    /// Ask the transport for a new connection.
    pub fn connect(&mut self, address: &str, port: u16) {
        info!("Connecting to {address}:{port}");
        let conn = &mut self.connection;
        conn.quiet = false;
        conn.link_active = true;
        conn.last_endpoint = Some((address.to_string(), port));
        conn.transition(ConnectionState::Connecting);
        self.commands.push(TransportCommand::Connect {
            address: address.to_string(),
            port,
        });
    }

    /// Connect again to the last endpoint. Returns `false` if there is none.
    pub fn reconnect(&mut self) -> bool {
        match self.connection.last_endpoint.clone() {
            Some((address, port)) => {
                self.connect(&address, port);
                true
            }
            None => false,
        }
    }

    /// Disconnect and show the usual notice once the transport confirms.
    pub fn disconnect(&mut self) {
        self.connection.link_active = false;
        self.connection.transition(ConnectionState::Disconnected);
        self.commands.push(TransportCommand::Disconnect);
    }

    /// Disconnect without any notice. Session state is still reset.
    /// Safe to call from any state, including before the link is up.
    pub fn disconnect_quietly(&mut self) {
        self.connection.quiet = true;
        self.disconnect();
    }

    /// Disconnect and skip the reset that normally follows.
    pub fn disconnect_no_reset(&mut self) {
        self.connection.quiet_reset = true;
        self.disconnect_quietly();
    }

    /// Clear per-session state ahead of a handshake.
    fn reset_session(&mut self) {
        self.snapshots.clear();
        self.entities.clear();
        self.emitter.reset();
        let conn = &mut self.connection;
        conn.quiet = false;
        conn.quiet_reset = false;
        conn.last_sent_sequence = 0;
        conn.transition(ConnectionState::Connecting);
        self.commands.push(TransportCommand::SetClientLoaded(false));
    }

    /// Tear down everything the session built.
    fn terminal_reset(&mut self) {
        self.connection.transition(ConnectionState::Disconnected);
        self.entities.clear();
        self.world.clear();
        self.snapshots.clear();
        self.game.reset();
        self.emitter.reset();
        self.player.reset_session();
    }

    /// The transport connection is up: reset and send the handshake.
    pub fn on_connected(&mut self, address: &str) {
        self.player.reset_session();
        self.reset_session();

        if !self.connection.link_active {
            info!("Connection canceled.");
            self.disconnect_quietly();
            return;
        }

        let handshake = match build_handshake(self.identity.as_mut(), address, &self.hosts) {
            Ok(handshake) => handshake,
            Err(e) => {
                error!("Handshake aborted: {e}");
                self.events.push(ClientEvent::Notice(Notice::Error(ErrorNotice::InvalidId)));
                self.disconnect_quietly();
                return;
            }
        };
        self.call(protocol::CONNECT, &handshake.encode());
        self.connection.transition(ConnectionState::AwaitingWorld);
    }

    /// The compressed world arrived.
    pub fn on_world_stream(&mut self, data: &[u8]) {
        if !self.connection.is_connecting() {
            debug!("Ignoring world data in state {:?}", self.connection.state());
            return;
        }
        info!("Received world data: {} bytes.", data.len());

        let loaded = unpack_world_stream(data, &self.stream_limits)
            .map_err(|e| e.to_string())
            .and_then(|raw| self.world.load(&raw).map_err(|e| e.to_string()));
        if let Err(e) = loaded {
            error!("Failed to load world data: {e}");
            self.events
                .push(ClientEvent::Notice(Notice::Error(ErrorNotice::WorldLoadFailed)));
            self.disconnect_quietly();
            return;
        }
        self.finish_connecting();
    }

    fn finish_connecting(&mut self) {
        self.game.phase = GamePhase::Playing;
        self.connection.transition(ConnectionState::Playing);
        self.commands.push(TransportCommand::SetClientLoaded(true));
        self.call(protocol::CONNECT_CONFIRM, &[]);
        self.events.push(ClientEvent::Notice(Notice::LoadingDone));

        if !self.connection.first_load_done {
            self.connection.first_load_done = true;
            self.events.push(ClientEvent::ServerJoined);
        }
    }

    /// The transport connection is gone.
    pub fn on_disconnected(&mut self, reason: Option<&str>) {
        if self.connection.quiet_reset {
            debug!("Skipping reset for redirected connection");
            self.connection.quiet_reset = false;
            return;
        }

        self.connection.link_active = false;
        self.terminal_reset();

        if let Some((address, port)) = self.connection.pending_reconnect.take() {
            self.connect(&address, port);
            return;
        }
        if !self.connection.quiet {
            let title = DisconnectTitle::from_reason(reason);
            self.events
                .push(ClientEvent::Notice(Notice::Disconnected { title }));
        }
    }

    /// The server kicked us with a known reason.
    pub fn kick(&mut self, reason: KickReason) {
        info!("Kicked from server: {reason:?}");
        self.disconnect_quietly();

        if reason == KickReason::ServerRestarting {
            self.connection.pending_reconnect = self.connection.last_endpoint.clone();
            return;
        }
        if !reason.quiet() {
            self.events
                .push(ClientEvent::Notice(Notice::Kicked { reason }));
        }
    }

    /// The server kicked us with free text.
    pub fn kick_text(&mut self, text: String) {
        info!("Kicked from server: {text}");
        self.disconnect_quietly();
        self.events
            .push(ClientEvent::Notice(Notice::KickedWithText { text }));
    }

    /// The server wants us on another host.
    pub fn redirect(&mut self, address: &str, port: u16) {
        if address.starts_with("steam:") && !self.steam_capable {
            warn!("Ignoring redirect to {address}: transport cannot reach it");
            return;
        }
        info!("Server sending us to {address}:{port}");
        self.disconnect_no_reset();
        self.terminal_reset();
        self.connect(address, port);
    }

    /// The server is about to stream a new world.
    pub fn world_data_begin(&mut self) {
        self.entities.clear();
        self.snapshots.clear();
        self.game.reset();
        self.connection.transition(ConnectionState::AwaitingWorld);
        self.commands.push(TransportCommand::SetClientLoaded(false));
        self.events.push(ClientEvent::Notice(Notice::LoadingWorld));
    }

    /// Per-tick update.
    pub fn tick(&mut self, delta_ticks: f32) {
        if !self.connection.link_active {
            return;
        }

        match self.connection.state() {
            ConnectionState::Playing if self.game.is_game() => self.emit(delta_ticks),
            ConnectionState::Connecting | ConnectionState::AwaitingWorld => {
                self.connection.timeout_ticks += delta_ticks;
                if self.connection.timeout_ticks > self.network.data_timeout_ticks as f32 {
                    error!("Failed to load data!");
                    self.connection.quiet = true;
                    self.events
                        .push(ClientEvent::Notice(Notice::Error(ErrorNotice::DataTimeout)));
                    self.disconnect();
                }
            }
            state => {
                warn!("Disconnecting: session drifted to {state:?} with no game running");
                self.disconnect();
            }
        }
    }

    fn emit(&mut self, delta_ticks: f32) {
        let state = self.player.state();
        let now = self.clock.now_millis();
        let out = self.emitter.tick(
            delta_ticks,
            &mut self.connection.last_sent_sequence,
            &state,
            now,
        );
        if let Some(args) = out.state {
            self.call(protocol::CLIENT_STATE_SNAPSHOT, &args);
        }
        if let Some(sent) = out.ping {
            let args = protocol::encode_ping(self.entities.local_player_id(), sent);
            self.call(protocol::PING, &args);
        }
    }
}
