//! Handlers for the procedures the server invokes on the client.
//!
//! Each handler decodes its arguments and hands off to [`ClientCore`].
//! A decode error leaves the core untouched unless noted.

use glam::Vec2;

use outpost_net::{CallHandler, DecodeError, WireReader};

use crate::client::ClientCore;
use crate::events::ClientEvent;
use crate::lifecycle::KickReason;
use crate::protocol;
use crate::snapshot::StateSnapshot;

type Handler = fn(&mut ClientCore, &mut WireReader) -> Result<(), DecodeError>;

/// The client's handler for `name`, or `None` if the client only sends it.
pub(crate) fn handler_for(name: &'static str) -> Option<Box<dyn CallHandler<ClientCore>>> {
    let handler: Handler = match name {
        protocol::WORLD_DATA_BEGIN => world_data_begin,
        protocol::ENTITY_SNAPSHOT => entity_snapshot,
        protocol::HIDDEN_SNAPSHOT => hidden_snapshot,
        protocol::BLOCK_SNAPSHOT => block_snapshot,
        protocol::WORLD_STATE_SNAPSHOT => world_state_snapshot,
        protocol::ENTITY_DISCONNECTED => entity_disconnected,
        protocol::PING_REPLY => ping_reply,
        protocol::KICK => kick,
        protocol::KICK_TEXT => kick_text,
        protocol::CONNECT_REDIRECT => connect_redirect,
        protocol::SET_RULES => set_rules,
        protocol::SET_OBJECTIVES => set_objectives,
        protocol::OBJECTIVE_FLAGS_DELTA => objective_flags_delta,
        protocol::SET_POSITION => set_position,
        protocol::SET_CAMERA_POSITION => set_camera_position,
        protocol::CHAT_MESSAGE => chat_message,
        protocol::CUSTOM_PACKET_RELIABLE | protocol::CUSTOM_PACKET_UNRELIABLE => custom_packet,
        _ => return None,
    };
    Some(Box::new(handler))
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

fn entity_snapshot(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let amount = args.read_u16()?;
    let data = args.read_bytes()?;
    core.snapshots
        .apply_entities(amount, data, core.entities.as_mut(), &mut core.events);
    Ok(())
}

fn hidden_snapshot(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let count = args.read_u16()?;
    let ids = (0..count)
        .map(|_| args.read_i32())
        .collect::<Result<Vec<_>, _>>()?;
    core.snapshots.apply_hidden(&ids, core.entities.as_mut());
    Ok(())
}

fn block_snapshot(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let amount = args.read_u16()?;
    let data = args.read_bytes()?;
    core.snapshots.apply_blocks(amount, data, core.world.as_mut());
    Ok(())
}

fn world_state_snapshot(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let snapshot = StateSnapshot::read(args)?;
    core.snapshots
        .apply_state(snapshot, &mut core.game, core.world.as_mut(), &mut core.events);
    Ok(())
}

fn entity_disconnected(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let id = args.read_i32()?;
    core.snapshots
        .entity_disconnected(id, core.entities.as_mut(), &mut core.events);
    Ok(())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

fn world_data_begin(core: &mut ClientCore, _args: &mut WireReader) -> Result<(), DecodeError> {
    core.world_data_begin();
    Ok(())
}

fn ping_reply(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let sent = args.read_i64()?;
    let now = core.clock.now_millis();
    core.emitter.ping.record(sent, now);
    Ok(())
}

fn kick(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let code = args.read_u8()?;
    let reason = KickReason::from_code(code)
        .ok_or_else(|| DecodeError::Invalid(format!("unknown kick reason {code}")))?;
    core.kick(reason);
    Ok(())
}

fn kick_text(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let text = args.read_str()?;
    core.kick_text(text);
    Ok(())
}

fn connect_redirect(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let address = args.read_str()?;
    let port = args.read_i32()?;
    let port = u16::try_from(port).map_err(|_| DecodeError::Invalid(format!("port {port} out of range")))?;
    core.redirect(&address, port);
    Ok(())
}

// ---------------------------------------------------------------------------
// Rules and objectives
// ---------------------------------------------------------------------------

fn set_rules(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    core.game.rules = Some(args.read_bytes()?);
    Ok(())
}

fn set_objectives(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    core.game.objectives = Some(args.read_bytes()?);
    core.events.push(ClientEvent::ObjectivesReplaced);
    Ok(())
}

fn objective_flags_delta(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let removed = args.read_str_list()?;
    let added = args.read_str_list()?;
    core.game.apply_flag_delta(&removed, &added);
    Ok(())
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

fn set_position(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let x = args.read_f32()?;
    let y = args.read_f32()?;
    core.player.set_position(Vec2::new(x, y));
    Ok(())
}

fn set_camera_position(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let x = args.read_f32()?;
    let y = args.read_f32()?;
    core.player.set_camera_position(Vec2::new(x, y));
    Ok(())
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

fn chat_message(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let message = args.read_str_opt()?;
    let raw = args.read_str_opt()?;
    let sender = args.read_entity_ref()?;
    core.on_chat_message(message, raw, sender);
    Ok(())
}

fn custom_packet(core: &mut ClientCore, args: &mut WireReader) -> Result<(), DecodeError> {
    let key = args.read_str()?;
    let contents = args.read_str()?;
    core.on_custom_packet(&key, &contents);
    Ok(())
}
