//! End-to-end behaviour of the client core against in-memory collaborators.

use bytes::Bytes;
use glam::Vec2;

use outpost_client::chat::ClickAction;
use outpost_client::collab::{EntityDirectory, Profile};
use outpost_client::memory::{
    EntityMap, ManualClock, PLAYER_TAG, ScriptedPlayer, StaticIdentity, TileGrid, UNIT_TAG, encode_world,
    standard_types,
};
use outpost_client::protocol::{self, build_dispatcher};
use outpost_client::snapshot::{ItemStock, StateSnapshot, encode_core_data};
use outpost_client::{
    ClientEvent, Collaborators, ConnectionState, DisconnectTitle, ErrorNotice, GamePhase, KickReason,
    NetClient, Notice,
};
use outpost_config::Config;
use outpost_net::{
    Dispatch, ProcedureTable, SenderRole, StreamLimits, TransportCommand, TransportEvent, WireWriter,
    pack_world_stream,
};

const LOCAL_ID: i32 = 100;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    client: NetClient,
    clock: ManualClock,
    server: ProcedureTable,
}

fn profile() -> Profile {
    Profile {
        name: "me".into(),
        color: 0xffd3_7fff,
        locale: "en".into(),
        mods: Vec::new(),
        mobile: false,
        version_type: "official".into(),
        version: 146,
    }
}

fn harness_with(device_id: Option<&str>) -> Harness {
    let clock = ManualClock::new(10_000);
    let world = TileGrid::new();
    let collab = Collaborators {
        entities: Box::new(EntityMap::with_local_player(LOCAL_ID, "me")),
        world: Box::new(world),
        player: Box::new(ScriptedPlayer::alive(LOCAL_ID, Vec2::new(8.0, 16.0))),
        identity: Box::new(StaticIdentity::new(profile(), device_id.map(str::to_string))),
        clock: Box::new(clock.clone()),
    };
    let client = NetClient::new(&Config::default(), standard_types(), collab).unwrap();
    let server = build_dispatcher::<()>(|_| None).unwrap().table().clone();
    Harness { client, clock, server }
}

fn harness() -> Harness {
    harness_with(Some("device-1"))
}

impl Harness {
    fn call(&mut self, name: &str, args: Bytes) {
        let frame = self.server.encode(name, &args).unwrap().frame;
        self.client.handle_transport_event(TransportEvent::Call(frame));
    }

    fn connected(&mut self) {
        self.client.handle_transport_event(TransportEvent::Connected {
            address: "/127.0.0.1:6567".into(),
        });
    }

    fn world(&mut self, buildings: &[(i32, u16)], teams: &[u8]) {
        let raw = encode_world(buildings, teams);
        let packed = pack_world_stream(&raw, &StreamLimits::default());
        self.client
            .handle_transport_event(TransportEvent::WorldStream(Bytes::from(packed)));
    }

    fn join(&mut self) {
        self.client.connect("127.0.0.1", 6567);
        self.connected();
        self.world(&[(5, 3), (6, 4), (7, 3)], &[1]);
        assert_eq!(self.client.core().state(), ConnectionState::Playing);
    }

    fn dropped(&mut self, reason: Option<&str>) {
        self.client.handle_transport_event(TransportEvent::Disconnected {
            reason: reason.map(str::to_string),
        });
    }

    fn sent(&mut self) -> Vec<&'static str> {
        self.client
            .drain_commands()
            .into_iter()
            .filter_map(|c| match c {
                TransportCommand::Send(call) => Some(call.procedure),
                _ => None,
            })
            .collect()
    }

    fn notices(&mut self) -> Vec<Notice> {
        self.client
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                ClientEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn entities(&self) -> &EntityMap {
        self.client.core().entities_as::<EntityMap>().unwrap()
    }

    fn grid(&self) -> &TileGrid {
        self.client.core().world_as::<TileGrid>().unwrap()
    }
}

fn entity_batch(records: &[(i32, u8)]) -> Bytes {
    let mut data = WireWriter::new();
    for &(id, tag) in records {
        data.write_i32(id).write_u8(tag);
        match tag {
            PLAYER_TAG => {
                data.write_str("Ana").write_str("ffd37fff").write_f32(1.0).write_f32(2.0);
            }
            _ => {
                data.write_f32(1.0).write_f32(2.0).write_f32(0.0);
            }
        }
    }
    let data = data.finish();
    let mut args = WireWriter::new();
    args.write_u16(records.len() as u16).write_bytes(&data);
    args.finish()
}

fn state(wave: i32) -> Bytes {
    let snapshot = StateSnapshot {
        wave_time: 600.0,
        wave,
        enemies: 2,
        paused: false,
        game_over: false,
        time_data: 42,
        tps: 60,
        rand: [1, 2],
        core_data: encode_core_data(&[(1, ItemStock { items: vec![(0, 250)] })]),
    };
    let mut out = WireWriter::new();
    snapshot.write(&mut out);
    out.finish()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_join_sends_handshake_then_confirm() {
    let mut h = harness();
    h.client.connect("127.0.0.1", 6567);
    assert_eq!(
        h.client.drain_commands(),
        vec![TransportCommand::Connect {
            address: "127.0.0.1".into(),
            port: 6567
        }]
    );
    h.connected();
    assert_eq!(h.client.core().state(), ConnectionState::AwaitingWorld);
    assert_eq!(h.sent(), vec![protocol::CONNECT]);

    h.world(&[(5, 3)], &[1]);
    let commands = h.client.drain_commands();
    assert!(commands.contains(&TransportCommand::SetClientLoaded(true)));
    assert_eq!(h.client.core().game().phase, GamePhase::Playing);
    assert_eq!(h.grid().building_count(), 1);
}

#[test]
fn test_first_load_fires_once_across_reconnects() {
    let mut h = harness();
    let mut joins = 0;
    for _ in 0..3 {
        h.join();
        joins += h
            .client
            .drain_events()
            .iter()
            .filter(|e| **e == ClientEvent::ServerJoined)
            .count();
        h.dropped(Some("closed"));
        assert_eq!(h.client.core().state(), ConnectionState::Disconnected);
    }
    assert_eq!(joins, 1);
    assert!(h.client.core().connection().first_load_done());
}

#[test]
fn test_no_emission_unless_playing() {
    let mut h = harness();
    for _ in 0..120 {
        h.client.update(1.0);
    }
    assert!(h.client.drain_commands().is_empty());

    h.client.connect("127.0.0.1", 6567);
    h.connected();
    h.client.drain_commands();
    for _ in 0..120 {
        h.client.update(1.0);
    }
    assert!(!h.sent().contains(&protocol::CLIENT_STATE_SNAPSHOT));

    h.world(&[], &[]);
    h.client.drain_commands();
    for _ in 0..8 {
        h.client.update(1.0);
    }
    let sent = h.sent();
    assert_eq!(sent.iter().filter(|p| **p == protocol::CLIENT_STATE_SNAPSHOT).count(), 2);
}

#[test]
fn test_data_timeout_disconnects_quietly() {
    let mut h = harness();
    h.client.connect("127.0.0.1", 6567);
    h.connected();
    h.client.drain_events();
    for _ in 0..1801 {
        h.client.update(1.0);
    }
    assert!(h.client.drain_commands().contains(&TransportCommand::Disconnect));
    assert_eq!(h.notices(), vec![Notice::Error(ErrorNotice::DataTimeout)]);

    h.dropped(Some("closed"));
    assert!(h.notices().is_empty());
    assert_eq!(h.client.core().state(), ConnectionState::Disconnected);
}

#[test]
fn test_disconnect_titles_are_distinct() {
    let mut h = harness();
    let mut titles = Vec::new();
    for reason in ["timeout", "closed", "reset by peer"] {
        h.join();
        h.client.drain_events();
        h.dropped(Some(reason));
        titles.extend(h.notices().into_iter().filter_map(|n| match n {
            Notice::Disconnected { title } => Some(title),
            _ => None,
        }));
    }
    assert_eq!(
        titles,
        vec![DisconnectTitle::Timeout, DisconnectTitle::Closed, DisconnectTitle::Error]
    );
}

#[test]
fn test_disconnect_resets_session_state() {
    let mut h = harness();
    h.join();
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(1, UNIT_TAG)]));
    assert!(h.entities().contains(1));
    h.dropped(None);
    assert!(h.entities().is_empty());
    assert_eq!(h.grid().building_count(), 0);
    assert!(h.client.core().snapshots().removed().is_empty());
    assert_eq!(h.client.core().game().phase, GamePhase::Menu);
}

#[test]
fn test_cancel_before_connected() {
    let mut h = harness();
    h.client.connect("127.0.0.1", 6567);
    h.client.core_mut().disconnect_quietly();
    h.client.drain_commands();

    h.connected();
    let commands = h.client.drain_commands();
    assert!(commands.contains(&TransportCommand::Disconnect));
    assert!(!commands.iter().any(|c| matches!(c, TransportCommand::Send(_))));

    h.dropped(None);
    assert!(h.notices().is_empty());
}

#[test]
fn test_missing_device_id_aborts_handshake() {
    let mut h = harness_with(None);
    h.client.connect("127.0.0.1", 6567);
    h.connected();
    let commands = h.client.drain_commands();
    assert!(commands.contains(&TransportCommand::Disconnect));
    assert!(!commands.iter().any(|c| matches!(c, TransportCommand::Send(_))));
    assert_eq!(h.notices(), vec![Notice::Error(ErrorNotice::InvalidId)]);
}

#[test]
fn test_corrupt_world_fails_quietly() {
    let mut h = harness();
    h.client.connect("127.0.0.1", 6567);
    h.connected();
    h.client.drain_events();
    h.client
        .handle_transport_event(TransportEvent::WorldStream(Bytes::from_static(&[0x00, 0x00])));
    assert_eq!(h.notices(), vec![Notice::Error(ErrorNotice::WorldLoadFailed)]);
    assert!(h.client.drain_commands().contains(&TransportCommand::Disconnect));
}

#[test]
fn test_world_data_begin_reloads_without_rejoin_event() {
    let mut h = harness();
    h.join();
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(1, UNIT_TAG)]));
    h.client.drain_events();
    h.client.drain_commands();

    h.call(protocol::WORLD_DATA_BEGIN, Bytes::new());
    assert_eq!(h.client.core().state(), ConnectionState::AwaitingWorld);
    assert!(h.entities().is_empty());
    assert!(h.client.drain_commands().contains(&TransportCommand::SetClientLoaded(false)));

    h.world(&[], &[]);
    let events = h.client.drain_events();
    assert!(events.contains(&ClientEvent::Notice(Notice::LoadingWorld)));
    assert!(events.contains(&ClientEvent::Notice(Notice::LoadingDone)));
    assert!(!events.contains(&ClientEvent::ServerJoined));
    assert_eq!(h.client.core().state(), ConnectionState::Playing);
}

// ---------------------------------------------------------------------------
// Kicks and redirects
// ---------------------------------------------------------------------------

fn kick_args(reason: KickReason) -> Bytes {
    let mut out = WireWriter::new();
    out.write_u8(reason.code());
    out.finish()
}

#[test]
fn test_kick_shows_reason_once() {
    let mut h = harness();
    h.join();
    h.client.drain_events();
    h.call(protocol::KICK, kick_args(KickReason::Banned));
    assert_eq!(h.notices(), vec![Notice::Kicked { reason: KickReason::Banned }]);
    assert!(h.client.drain_commands().contains(&TransportCommand::Disconnect));

    h.dropped(Some("closed"));
    assert!(h.notices().is_empty());
    assert_eq!(h.client.core().state(), ConnectionState::Disconnected);
}

#[test]
fn test_game_over_kick_is_silent() {
    let mut h = harness();
    h.join();
    h.client.drain_events();
    h.call(protocol::KICK, kick_args(KickReason::GameOver));
    h.dropped(None);
    assert!(h.notices().is_empty());
}

#[test]
fn test_server_restart_reconnects() {
    let mut h = harness();
    h.join();
    h.client.drain_commands();
    h.call(protocol::KICK, kick_args(KickReason::ServerRestarting));
    h.dropped(None);
    let commands = h.client.drain_commands();
    assert!(commands.contains(&TransportCommand::Connect {
        address: "127.0.0.1".into(),
        port: 6567
    }));
    assert_eq!(h.client.core().state(), ConnectionState::Connecting);
}

#[test]
fn test_redirect_skips_reset_of_new_connection() {
    let mut h = harness();
    h.join();
    h.client.drain_commands();
    h.client.drain_events();

    let mut args = WireWriter::new();
    args.write_str("10.0.0.7").write_i32(7000);
    h.call(protocol::CONNECT_REDIRECT, args.finish());
    assert_eq!(
        h.client.drain_commands(),
        vec![
            TransportCommand::Disconnect,
            TransportCommand::Connect {
                address: "10.0.0.7".into(),
                port: 7000
            }
        ]
    );

    // Close of the old link must not touch the pending connection.
    h.dropped(None);
    assert_eq!(h.client.core().state(), ConnectionState::Connecting);
    assert!(h.notices().is_empty());

    h.client.handle_transport_event(TransportEvent::Connected {
        address: "/10.0.0.7:7000".into(),
    });
    assert_eq!(h.sent(), vec![protocol::CONNECT]);
}

#[test]
fn test_steam_redirect_ignored_without_capability() {
    let mut h = harness();
    h.join();
    h.client.drain_commands();
    let mut args = WireWriter::new();
    args.write_str("steam:1234").write_i32(0);
    h.call(protocol::CONNECT_REDIRECT, args.finish());
    assert!(h.client.drain_commands().is_empty());
    assert_eq!(h.client.core().state(), ConnectionState::Playing);
}

#[test]
fn test_server_only_call_from_client_is_ignored() {
    let mut h = harness();
    h.join();
    let frame = h.server.encode(protocol::KICK, &kick_args(KickReason::Kick)).unwrap().frame;
    let outcome = h.client.handle_call(frame, SenderRole::Client).unwrap();
    assert_eq!(outcome, Dispatch::Ignored);
    assert_eq!(h.client.core().state(), ConnectionState::Playing);
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_tag_keeps_earlier_records_and_connection() {
    let mut h = harness();
    h.join();
    h.client.drain_commands();
    h.call(
        protocol::ENTITY_SNAPSHOT,
        entity_batch(&[(1, UNIT_TAG), (2, 99), (3, UNIT_TAG)]),
    );
    assert!(h.entities().contains(1));
    assert!(!h.entities().contains(2));
    assert!(!h.entities().contains(3));
    assert_eq!(h.client.core().state(), ConnectionState::Playing);
    assert!(!h.client.drain_commands().contains(&TransportCommand::Disconnect));
}

#[test]
fn test_duplicate_birth_joins_once_and_left_player_stays_gone() {
    let mut h = harness();
    h.join();
    h.client.drain_events();
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(7, PLAYER_TAG)]));
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(7, PLAYER_TAG)]));
    let joined = h
        .client
        .drain_events()
        .into_iter()
        .filter(|e| *e == ClientEvent::PlayerJoined { id: 7 })
        .count();
    assert_eq!(joined, 1);

    let mut args = WireWriter::new();
    args.write_i32(7);
    h.call(protocol::ENTITY_DISCONNECTED, args.finish());
    assert_eq!(h.client.drain_events(), vec![ClientEvent::PlayerLeft { id: 7 }]);

    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(7, PLAYER_TAG)]));
    assert!(!h.entities().contains(7));
    assert!(h.client.drain_events().is_empty());
}

#[test]
fn test_bulk_sync_holds_back_join_events() {
    let mut h = harness();
    h.join();
    h.client.drain_events();

    h.client.core_mut().set_syncing(true);
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(7, PLAYER_TAG), (8, UNIT_TAG)]));
    assert!(h.entities().contains(7));
    assert!(h.client.drain_events().is_empty());

    h.client.core_mut().set_syncing(false);
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(7, PLAYER_TAG), (9, PLAYER_TAG)]));
    assert_eq!(h.client.drain_events(), vec![ClientEvent::PlayerJoined { id: 9 }]);

    h.client.core_mut().set_syncing(true);
    h.dropped(None);
    assert!(!h.client.core().snapshots().syncing);
}

#[test]
fn test_local_player_attached_from_snapshot() {
    let mut h = harness();
    h.join();
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(LOCAL_ID, PLAYER_TAG)]));
    let local = h.entities().player(LOCAL_ID).unwrap();
    assert_eq!(local.position, Vec2::new(1.0, 2.0));
}

#[test]
fn test_hidden_snapshot_marks_units() {
    let mut h = harness();
    h.join();
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(1, UNIT_TAG)]));
    let mut args = WireWriter::new();
    args.write_u16(2).write_i32(1).write_i32(55);
    h.call(protocol::HIDDEN_SNAPSHOT, args.finish());
    assert!(h.entities().unit(1).unwrap().hidden);
}

#[test]
fn test_block_mismatch_aborts_rest_of_batch() {
    let mut h = harness();
    h.join();
    let mut data = WireWriter::new();
    data.write_i32(5).write_u16(3).write_f32(10.0);
    data.write_i32(6).write_u16(9).write_f32(20.0);
    data.write_i32(7).write_u16(3).write_f32(30.0);
    let data = data.finish();
    let mut args = WireWriter::new();
    args.write_u16(3).write_bytes(&data);
    h.call(protocol::BLOCK_SNAPSHOT, args.finish());

    assert_eq!(h.grid().building(5).unwrap().health, 10.0);
    assert_eq!(h.grid().building(6).unwrap().health, 0.0);
    assert_eq!(h.grid().building(7).unwrap().health, 0.0);
    assert_eq!(h.client.core().state(), ConnectionState::Playing);
}

#[test]
fn test_wave_notification_only_on_increase() {
    let mut h = harness();
    h.join();
    h.client.drain_events();
    for wave in [3, 3, 2, 4] {
        h.call(protocol::WORLD_STATE_SNAPSHOT, state(wave));
    }
    let waves: Vec<_> = h
        .client
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            ClientEvent::WaveChanged { wave } => Some(wave),
            _ => None,
        })
        .collect();
    assert_eq!(waves, vec![3, 4]);

    let game = h.client.core().game();
    assert_eq!(game.wave, 4);
    assert_eq!(game.server_tps, 60);
    assert_eq!(h.grid().core_items(1).unwrap().amount(0), Some(250));
}

// ---------------------------------------------------------------------------
// Ping, position, rules
// ---------------------------------------------------------------------------

#[test]
fn test_ping_probe_and_reply() {
    let mut h = harness();
    h.join();
    h.client.drain_commands();
    for _ in 0..60 {
        h.client.update(1.0);
    }
    assert!(h.sent().contains(&protocol::PING));

    let sent_at = 10_000;
    h.clock.advance(80);
    let mut args = WireWriter::new();
    args.write_i64(sent_at);
    h.call(protocol::PING_REPLY, args.finish());
    assert_eq!(h.client.core().ping(), 80);
}

#[test]
fn test_server_moves_player_and_camera() {
    let mut h = harness();
    h.join();
    let mut args = WireWriter::new();
    args.write_f32(40.0).write_f32(80.0);
    h.call(protocol::SET_POSITION, args.finish());
    let mut args = WireWriter::new();
    args.write_f32(1.0).write_f32(2.0);
    h.call(protocol::SET_CAMERA_POSITION, args.finish());

    let player = h.client.core().player_as::<ScriptedPlayer>().unwrap();
    assert_eq!(player.state.position, Vec2::new(40.0, 80.0));
    assert_eq!(player.state.unit.as_ref().unwrap().position, Vec2::new(40.0, 80.0));
    assert_eq!(player.state.camera.center, Vec2::new(1.0, 2.0));
}

#[test]
fn test_rules_objectives_and_flags() {
    let mut h = harness();
    h.join();
    h.client.drain_events();

    let mut args = WireWriter::new();
    args.write_bytes(b"rules");
    h.call(protocol::SET_RULES, args.finish());
    let mut args = WireWriter::new();
    args.write_bytes(b"objectives");
    h.call(protocol::SET_OBJECTIVES, args.finish());
    let mut args = WireWriter::new();
    args.write_str_list::<&str>(&[]).write_str_list(&["boss"]);
    h.call(protocol::OBJECTIVE_FLAGS_DELTA, args.finish());

    let game = h.client.core().game();
    assert_eq!(game.rules.as_deref(), Some(&b"rules"[..]));
    assert_eq!(game.objectives.as_deref(), Some(&b"objectives"[..]));
    assert!(game.objective_flags.contains("boss"));
    assert_eq!(h.client.drain_events(), vec![ClientEvent::ObjectivesReplaced]);
}

// ---------------------------------------------------------------------------
// Chat and custom packets
// ---------------------------------------------------------------------------

fn chat_args(message: &str, raw: Option<&str>, sender: Option<i32>) -> Bytes {
    let mut out = WireWriter::new();
    out.write_str_opt(Some(message)).write_str_opt(raw).write_entity_ref(sender);
    out.finish()
}

#[test]
fn test_chat_coordinate_becomes_jump_target() {
    let mut h = harness();
    h.join();
    h.call(protocol::ENTITY_SNAPSHOT, entity_batch(&[(7, PLAYER_TAG)]));
    h.client.drain_events();

    h.call(
        protocol::CHAT_MESSAGE,
        chat_args("[coral][[Ana[coral]]: meet 34, 58", Some("meet 34, 58"), Some(7)),
    );
    let events = h.client.drain_events();
    assert!(events.contains(&ClientEvent::ChatBubble {
        entity: 7,
        text: "meet [scarlet]34, 58[]".into()
    }));
    let line = events
        .iter()
        .find_map(|e| match e {
            ClientEvent::ChatReceived(line) => Some(line),
            _ => None,
        })
        .unwrap();
    assert!(line.text.ends_with("meet [scarlet]34, 58[]"));
    assert!(line
        .regions
        .iter()
        .any(|r| r.action == ClickAction::JumpTo(Vec2::new(272.0, 464.0))));
    assert!(line.regions.iter().any(|r| r.action == ClickAction::FocusSender(7)));
    assert_eq!(h.client.core().chat().last_position(), Some(Vec2::new(34.0, 58.0)));
}

#[test]
fn test_chat_from_unknown_sender_has_no_header() {
    let mut h = harness();
    h.join();
    h.client.drain_events();
    h.call(protocol::CHAT_MESSAGE, chat_args("server restarting soon", None, Some(999)));
    let events = h.client.drain_events();
    assert_eq!(events.len(), 1);
    let ClientEvent::ChatReceived(line) = &events[0] else {
        panic!("expected chat line, got {events:?}");
    };
    assert_eq!(line.text, "server restarting soon");
    assert_eq!(line.sender, None);
}

#[test]
fn test_send_chat_only_while_playing() {
    let mut h = harness();
    assert!(!h.client.core_mut().send_chat("hello"));
    h.join();
    h.client.drain_commands();
    assert!(h.client.core_mut().send_chat("hello"));
    assert_eq!(h.sent(), vec![protocol::SEND_CHAT_MESSAGE]);
}

#[test]
fn test_custom_packet_fan_out() {
    use std::sync::{Arc, Mutex};

    let mut h = harness();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    h.client
        .core_mut()
        .custom_packets()
        .add_handler("plugin:sync", move |text: &str| sink.lock().unwrap().push(text.to_string()));
    h.join();

    for name in [protocol::CUSTOM_PACKET_RELIABLE, protocol::CUSTOM_PACKET_UNRELIABLE] {
        let mut args = WireWriter::new();
        args.write_str("plugin:sync").write_str(name);
        h.call(name, args.finish());
    }
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            protocol::CUSTOM_PACKET_RELIABLE.to_string(),
            protocol::CUSTOM_PACKET_UNRELIABLE.to_string()
        ]
    );
}
