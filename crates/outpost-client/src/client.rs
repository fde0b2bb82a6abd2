//! The client core and its driver.
//!
//! [`ClientCore`] owns all session state and the collaborator handles. It
//! never performs I/O: transport requests are queued as
//! [`TransportCommand`]s and notifications as [`ClientEvent`]s, both drained
//! by the host once per tick.
//!
//! [`NetClient`] pairs the core with the dispatcher so that a handler can
//! borrow the core mutably while the dispatcher is borrowed shared.

use std::any::Any;

use bytes::Bytes;

use outpost_config::{Config, HostGroup, NetworkConfig};
use outpost_net::{
    Dispatch, DispatchError, ProcedureTable, RemoteCallDispatcher, SenderRole, StreamLimits,
    TransportCommand, TransportEvent,
};
use tracing::{debug, error, warn};

use crate::chat::{ChatPipeline, ChatSender};
use crate::collab::{Clock, EntityDirectory, IdentitySource, LocalPlayer, WorldAccess};
use crate::custom::CustomPacketRegistry;
use crate::emitter::ClientStateEmitter;
use crate::events::ClientEvent;
use crate::game::GameState;
use crate::handlers;
use crate::lifecycle::{Connection, ConnectionState};
use crate::protocol;
use crate::snapshot::{EntityTypeRegistry, SnapshotDecoder};

/// The external systems the core works against.
pub struct Collaborators {
    pub entities: Box<dyn EntityDirectory>,
    pub world: Box<dyn WorldAccess>,
    pub player: Box<dyn LocalPlayer>,
    pub identity: Box<dyn IdentitySource>,
    pub clock: Box<dyn Clock>,
}

// ---------------------------------------------------------------------------
// ClientCore
// ---------------------------------------------------------------------------

/// Session state plus collaborator handles.
pub struct ClientCore {
    pub(crate) connection: Connection,
    pub(crate) game: GameState,
    pub(crate) snapshots: SnapshotDecoder,
    pub(crate) emitter: ClientStateEmitter,
    pub(crate) chat: ChatPipeline,
    pub(crate) custom: CustomPacketRegistry,
    pub(crate) entities: Box<dyn EntityDirectory>,
    pub(crate) world: Box<dyn WorldAccess>,
    pub(crate) player: Box<dyn LocalPlayer>,
    pub(crate) identity: Box<dyn IdentitySource>,
    pub(crate) clock: Box<dyn Clock>,
    table: ProcedureTable,
    pub(crate) commands: Vec<TransportCommand>,
    pub(crate) events: Vec<ClientEvent>,
    pub(crate) network: NetworkConfig,
    pub(crate) hosts: Vec<HostGroup>,
    pub(crate) stream_limits: StreamLimits,
    /// The transport can follow `steam:` redirects.
    pub steam_capable: bool,
}

impl ClientCore {
    fn new(config: &Config, types: EntityTypeRegistry, collab: Collaborators, table: ProcedureTable) -> Self {
        let network = config.network.clone();
        Self {
            connection: Connection::default(),
            game: GameState::default(),
            snapshots: SnapshotDecoder::new(types),
            emitter: ClientStateEmitter::new(network.player_sync_ticks, network.ping_ticks),
            chat: ChatPipeline::new(config.chat.tile_size),
            custom: CustomPacketRegistry::new(),
            entities: collab.entities,
            world: collab.world,
            player: collab.player,
            identity: collab.identity,
            clock: collab.clock,
            table,
            commands: Vec::new(),
            events: Vec::new(),
            stream_limits: StreamLimits {
                max_inflated: network.max_world_bytes,
                ..StreamLimits::default()
            },
            network,
            hosts: config.hosts.clone(),
            steam_capable: false,
        }
    }

    /// Queue an outgoing call with pre-encoded arguments.
    pub(crate) fn call(&mut self, name: &'static str, args: &[u8]) {
        match self.table.encode(name, args) {
            Ok(call) => self.commands.push(TransportCommand::Send(call)),
            Err(e) => error!("Cannot encode '{name}': {e}"),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn snapshots(&self) -> &SnapshotDecoder {
        &self.snapshots
    }

    /// Hold back player-join events while the host streams in a bulk initial
    /// sync. Cleared again on every reset.
    pub fn set_syncing(&mut self, syncing: bool) {
        self.snapshots.syncing = syncing;
    }

    /// Smoothed round trip in milliseconds.
    pub fn ping(&self) -> i64 {
        self.emitter.ping.ping()
    }

    pub fn chat(&self) -> &ChatPipeline {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatPipeline {
        &mut self.chat
    }

    pub fn custom_packets(&mut self) -> &mut CustomPacketRegistry {
        &mut self.custom
    }

    pub fn entities(&self) -> &dyn EntityDirectory {
        self.entities.as_ref()
    }

    /// The entity directory as its concrete type.
    pub fn entities_as<T: EntityDirectory>(&self) -> Option<&T> {
        let any: &dyn Any = self.entities.as_ref();
        any.downcast_ref()
    }

    /// The world as its concrete type.
    pub fn world_as<T: WorldAccess>(&self) -> Option<&T> {
        let any: &dyn Any = self.world.as_ref();
        any.downcast_ref()
    }

    pub fn world_as_mut<T: WorldAccess>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = self.world.as_mut();
        any.downcast_mut()
    }

    /// The local player as its concrete type.
    pub fn player_as<T: LocalPlayer>(&self) -> Option<&T> {
        let any: &dyn Any = self.player.as_ref();
        any.downcast_ref()
    }

    pub fn player_as_mut<T: LocalPlayer>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = self.player.as_mut();
        any.downcast_mut()
    }

    /// Send a chat line. Returns `false` outside of play.
    pub fn send_chat(&mut self, text: &str) -> bool {
        if self.connection.state() != ConnectionState::Playing {
            debug!("Not sending chat while {:?}", self.connection.state());
            return false;
        }
        let args = protocol::encode_chat(self.entities.local_player_id(), text);
        self.call(protocol::SEND_CHAT_MESSAGE, &args);
        true
    }

    /// Format a received chat line and announce it.
    pub(crate) fn on_chat_message(&mut self, message: Option<String>, raw: Option<String>, sender: Option<i32>) {
        let sender = sender.and_then(|id| {
            let identity = self.entities.get(id)?.chat_identity()?;
            Some(ChatSender { id, identity })
        });
        let Some(line) = self.chat.receive(message, raw, sender) else {
            return;
        };
        if let (Some(entity), Some(text)) = (line.sender, line.raw.clone()) {
            self.events.push(ClientEvent::ChatBubble { entity, text });
        }
        self.events.push(ClientEvent::ChatReceived(line));
    }

    pub(crate) fn on_custom_packet(&mut self, key: &str, contents: &str) {
        if self.custom.dispatch(key, contents) == 0 {
            debug!("No handler for custom packet '{key}'");
        }
    }
}

// ---------------------------------------------------------------------------
// NetClient
// ---------------------------------------------------------------------------

/// Dispatcher plus core: the object a host drives.
pub struct NetClient {
    dispatcher: RemoteCallDispatcher<ClientCore>,
    core: ClientCore,
}

impl NetClient {
    pub fn new(config: &Config, types: EntityTypeRegistry, collab: Collaborators) -> Result<Self, DispatchError> {
        let dispatcher = protocol::build_dispatcher(handlers::handler_for)?;
        let core = ClientCore::new(config, types, collab, dispatcher.table().clone());
        Ok(Self { dispatcher, core })
    }

    /// Feed one transport event to the core.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected { address } => self.core.on_connected(&address),
            TransportEvent::Disconnected { reason } => self.core.on_disconnected(reason.as_deref()),
            TransportEvent::WorldStream(data) => self.core.on_world_stream(&data),
            TransportEvent::Call(frame) => {
                if let Err(e) = self.handle_call(frame, SenderRole::Server) {
                    warn!("Dropping remote call: {e}");
                }
            }
        }
    }

    /// Dispatch one call frame as if sent by `sender`.
    pub fn handle_call(&mut self, frame: Bytes, sender: SenderRole) -> Result<Dispatch, DispatchError> {
        self.dispatcher.dispatch_frame(frame, sender, &mut self.core)
    }

    /// Advance the session by `delta_ticks`.
    pub fn update(&mut self, delta_ticks: f32) {
        self.core.tick(delta_ticks);
    }

    pub fn connect(&mut self, address: &str, port: u16) {
        self.core.connect(address, port);
    }

    /// Commands queued since the last drain, in order.
    pub fn drain_commands(&mut self) -> Vec<TransportCommand> {
        std::mem::take(&mut self.core.commands)
    }

    /// Events queued since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.core.events)
    }

    pub fn core(&self) -> &ClientCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut ClientCore {
        &mut self.core
    }

    pub fn dispatcher(&self) -> &RemoteCallDispatcher<ClientCore> {
        &self.dispatcher
    }
}
