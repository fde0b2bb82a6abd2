//! The shared procedure table.
//!
//! Procedure ids are positions in [`procedure_table`], so client and server
//! must build their dispatchers from this list, in this order. Appending is
//! safe for a new protocol version; reordering is not.

use bytes::Bytes;

use outpost_net::{
    CallDirection::{Both, ClientToServer, ServerToClient},
    CallHandler, DispatchError, Priority, ProcedureSpec, RemoteCallDispatcher, WireWriter,
};

pub const CONNECT: &str = "connect";
pub const CONNECT_CONFIRM: &str = "connectConfirm";
pub const WORLD_DATA_BEGIN: &str = "worldDataBegin";
pub const ENTITY_SNAPSHOT: &str = "entitySnapshot";
pub const HIDDEN_SNAPSHOT: &str = "hiddenSnapshot";
pub const BLOCK_SNAPSHOT: &str = "blockSnapshot";
pub const WORLD_STATE_SNAPSHOT: &str = "worldStateSnapshot";
pub const CLIENT_STATE_SNAPSHOT: &str = "clientStateSnapshot";
pub const ENTITY_DISCONNECTED: &str = "entityDisconnected";
pub const PING: &str = "ping";
pub const PING_REPLY: &str = "pingReply";
pub const KICK: &str = "kick";
pub const KICK_TEXT: &str = "kickText";
pub const CONNECT_REDIRECT: &str = "connectRedirect";
pub const SET_RULES: &str = "setRules";
pub const SET_OBJECTIVES: &str = "setObjectives";
pub const OBJECTIVE_FLAGS_DELTA: &str = "objectiveFlagsDelta";
pub const SET_POSITION: &str = "setPosition";
pub const SET_CAMERA_POSITION: &str = "setCameraPosition";
pub const CHAT_MESSAGE: &str = "chatMessage";
pub const SEND_CHAT_MESSAGE: &str = "sendChatMessage";
pub const CUSTOM_PACKET_RELIABLE: &str = "customPacketReliable";
pub const CUSTOM_PACKET_UNRELIABLE: &str = "customPacketUnreliable";

/// Every procedure, in wire-id order.
pub fn procedure_table() -> Vec<ProcedureSpec> {
    vec![
        ProcedureSpec::new(CONNECT, ClientToServer).priority(Priority::High),
        ProcedureSpec::new(CONNECT_CONFIRM, ClientToServer),
        ProcedureSpec::new(WORLD_DATA_BEGIN, Both),
        ProcedureSpec::new(ENTITY_SNAPSHOT, ServerToClient)
            .unreliable()
            .priority(Priority::Low)
            .idempotent(),
        ProcedureSpec::new(HIDDEN_SNAPSHOT, ServerToClient)
            .unreliable()
            .priority(Priority::Low)
            .idempotent(),
        ProcedureSpec::new(BLOCK_SNAPSHOT, Both)
            .unreliable()
            .priority(Priority::Low)
            .idempotent(),
        ProcedureSpec::new(WORLD_STATE_SNAPSHOT, ServerToClient)
            .unreliable()
            .priority(Priority::Low)
            .idempotent(),
        ProcedureSpec::new(CLIENT_STATE_SNAPSHOT, ClientToServer)
            .unreliable()
            .idempotent(),
        ProcedureSpec::new(ENTITY_DISCONNECTED, ServerToClient),
        ProcedureSpec::new(PING, ClientToServer),
        ProcedureSpec::new(PING_REPLY, ServerToClient).unreliable(),
        ProcedureSpec::new(KICK, ServerToClient).priority(Priority::High),
        ProcedureSpec::new(KICK_TEXT, ServerToClient).priority(Priority::High),
        ProcedureSpec::new(CONNECT_REDIRECT, ServerToClient),
        ProcedureSpec::new(SET_RULES, Both),
        ProcedureSpec::new(SET_OBJECTIVES, Both),
        ProcedureSpec::new(OBJECTIVE_FLAGS_DELTA, Both),
        ProcedureSpec::new(SET_POSITION, ServerToClient),
        ProcedureSpec::new(SET_CAMERA_POSITION, ServerToClient).unreliable(),
        ProcedureSpec::new(CHAT_MESSAGE, ServerToClient),
        ProcedureSpec::new(SEND_CHAT_MESSAGE, ClientToServer),
        ProcedureSpec::new(CUSTOM_PACKET_RELIABLE, ServerToClient),
        ProcedureSpec::new(CUSTOM_PACKET_UNRELIABLE, ServerToClient).unreliable(),
    ]
}

/// Build a dispatcher over the full table. Procedures for which
/// `handler_for` returns `None` are declared as send-only.
pub fn build_dispatcher<C>(
    mut handler_for: impl FnMut(&'static str) -> Option<Box<dyn CallHandler<C>>>,
) -> Result<RemoteCallDispatcher<C>, DispatchError> {
    let mut dispatcher = RemoteCallDispatcher::new();
    for spec in procedure_table() {
        match handler_for(spec.name) {
            Some(handler) => dispatcher.register_boxed(spec, handler)?,
            None => dispatcher.declare(spec)?,
        };
    }
    Ok(dispatcher)
}

// ---------------------------------------------------------------------------
// Argument encoders for calls the client sends
// ---------------------------------------------------------------------------

pub fn encode_ping(sender: Option<i32>, timestamp: i64) -> Bytes {
    let mut out = WireWriter::with_capacity(12);
    out.write_entity_ref(sender).write_i64(timestamp);
    out.finish()
}

pub fn encode_chat(sender: Option<i32>, text: &str) -> Bytes {
    let mut out = WireWriter::with_capacity(6 + text.len());
    out.write_entity_ref(sender).write_str(text);
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let table = procedure_table();
        let names: HashSet<_> = table.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn test_declared_only_dispatcher_keeps_order() {
        let dispatcher = build_dispatcher::<()>(|_| None).unwrap();
        let table = dispatcher.table();
        assert_eq!(table.len(), procedure_table().len());
        assert_eq!(table.lookup(CONNECT).map(|(id, _)| id.0), Some(0));
        assert_eq!(table.lookup(CUSTOM_PACKET_UNRELIABLE).map(|(id, _)| id.0), Some(22));
    }

    #[test]
    fn test_snapshots_are_unreliable_low_priority() {
        for spec in procedure_table() {
            if spec.name.ends_with("Snapshot") && spec.name != CLIENT_STATE_SNAPSHOT {
                assert_eq!(spec.priority, Priority::Low, "{}", spec.name);
                assert!(spec.idempotent);
            }
        }
    }
}
