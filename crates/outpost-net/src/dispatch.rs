//! Remote procedure registry and dispatch.
//!
//! Every remote call is described by a [`ProcedureSpec`]: its name, which
//! side may invoke it ([`CallDirection`]), its delivery class
//! ([`Reliability`]) and its send [`Priority`]. Specs are collected in a
//! [`ProcedureTable`] whose insertion order defines the numeric
//! [`ProcedureId`] written on the wire, so both peers must build the table
//! from the same list.
//!
//! The [`RemoteCallDispatcher`] pairs the table with handlers. Incoming calls
//! from a role the direction does not allow are dropped with
//! [`Dispatch::Ignored`] and never reach the handler.
//!
//! Wire frame:
//!
//! ```text
//! +----------------------+------------------------+
//! | procedure id (u16 BE)| arguments (procedure-  |
//! |                      | specific layout)       |
//! +----------------------+------------------------+
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::codec::{DecodeError, WireReader, WireWriter};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// Which side of the connection is allowed to invoke a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallDirection {
    /// Sent by clients, executed on the server.
    ClientToServer,
    /// Sent by the server, executed on clients.
    ServerToClient,
    /// Either side may send.
    Both,
}

impl CallDirection {
    /// Returns `true` if a call from `sender` may run under this direction.
    pub fn accepts(self, sender: SenderRole) -> bool {
        matches!(
            (self, sender),
            (CallDirection::Both, _)
                | (CallDirection::ClientToServer, SenderRole::Client)
                | (CallDirection::ServerToClient, SenderRole::Server)
        )
    }
}

/// The role of the peer that sent an incoming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenderRole {
    Client,
    Server,
}

/// Delivery class. Only affects the transport, never handler logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reliability {
    /// Eventually delivered, in order per peer.
    Reliable,
    /// May be lost, duplicated or reordered.
    Unreliable,
}

/// Send priority hint for the transport's outgoing queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// Immutable description of one remote procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureSpec {
    /// Unique procedure name.
    pub name: &'static str,
    /// Who may invoke it.
    pub direction: CallDirection,
    /// Delivery class.
    pub reliability: Reliability,
    /// Send priority.
    pub priority: Priority,
    /// Handler tolerates duplicate delivery of the same logical event.
    pub idempotent: bool,
}

impl ProcedureSpec {
    /// A reliable, normal-priority, non-idempotent procedure.
    pub const fn new(name: &'static str, direction: CallDirection) -> Self {
        Self {
            name,
            direction,
            reliability: Reliability::Reliable,
            priority: Priority::Normal,
            idempotent: false,
        }
    }

    pub const fn unreliable(mut self) -> Self {
        self.reliability = Reliability::Unreliable;
        self
    }

    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub const fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }
}

/// Numeric procedure identifier written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcedureId(pub u16);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the procedure table and dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No procedure with this name is known.
    #[error("unknown procedure '{0}'")]
    UnknownProcedure(String),
    /// A frame carried an id outside the table.
    #[error("unknown procedure id {0}")]
    UnknownProcedureId(u16),
    /// A procedure name was declared twice.
    #[error("procedure '{0}' registered twice")]
    Duplicate(&'static str),
    /// The table already holds `u16::MAX` procedures.
    #[error("procedure table is full")]
    TableFull,
    /// The procedure is known but this peer has no handler for it.
    #[error("no handler registered for '{0}'")]
    NoHandler(&'static str),
    /// The frame or the handler's arguments failed to decode.
    #[error("failed to decode '{procedure}': {source}")]
    Decode {
        /// Procedure being decoded, or `"<frame>"` for the envelope.
        procedure: &'static str,
        /// Underlying codec error.
        #[source]
        source: DecodeError,
    },
}

// ---------------------------------------------------------------------------
// ProcedureTable
// ---------------------------------------------------------------------------

/// Ordered set of procedure descriptors shared by both peers.
#[derive(Debug, Clone, Default)]
pub struct ProcedureTable {
    specs: Vec<ProcedureSpec>,
    by_name: HashMap<&'static str, ProcedureId>,
}

/// An encoded call ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingCall {
    /// Procedure name, for logging.
    pub procedure: &'static str,
    /// Delivery class copied from the spec.
    pub reliability: Reliability,
    /// Priority copied from the spec.
    pub priority: Priority,
    /// Complete wire frame: id followed by arguments.
    pub frame: Bytes,
}

impl ProcedureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a spec, assigning it the next id.
    pub fn add(&mut self, spec: ProcedureSpec) -> Result<ProcedureId, DispatchError> {
        if self.by_name.contains_key(spec.name) {
            return Err(DispatchError::Duplicate(spec.name));
        }
        let id = u16::try_from(self.specs.len()).map_err(|_| DispatchError::TableFull)?;
        let id = ProcedureId(id);
        self.by_name.insert(spec.name, id);
        self.specs.push(spec);
        Ok(id)
    }

    /// Look up a spec by name.
    pub fn lookup(&self, name: &str) -> Option<(ProcedureId, &ProcedureSpec)> {
        let id = *self.by_name.get(name)?;
        self.specs.get(id.0 as usize).map(|spec| (id, spec))
    }

    /// Look up a spec by id.
    pub fn spec(&self, id: ProcedureId) -> Option<&ProcedureSpec> {
        self.specs.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProcedureId, &ProcedureSpec)> {
        self.specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (ProcedureId(i as u16), spec))
    }

    /// Wrap already-encoded arguments into a frame for `name`.
    pub fn encode(&self, name: &str, args: &[u8]) -> Result<OutgoingCall, DispatchError> {
        let (id, spec) = self
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownProcedure(name.to_string()))?;
        let mut w = WireWriter::with_capacity(2 + args.len());
        w.write_u16(id.0).write_raw(args);
        Ok(OutgoingCall {
            procedure: spec.name,
            reliability: spec.reliability,
            priority: spec.priority,
            frame: w.finish(),
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A procedure handler. Implemented for plain functions and closures.
pub trait CallHandler<C>: Send + Sync {
    /// Decode arguments from `args` and apply the call to `ctx`.
    fn handle(&self, ctx: &mut C, args: &mut WireReader) -> Result<(), DecodeError>;
}

impl<C, F> CallHandler<C> for F
where
    F: Fn(&mut C, &mut WireReader) -> Result<(), DecodeError> + Send + Sync,
{
    fn handle(&self, ctx: &mut C, args: &mut WireReader) -> Result<(), DecodeError> {
        self(ctx, args)
    }
}

/// Outcome of a dispatch attempt that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler ran.
    Executed,
    /// The sender's role is not allowed to invoke the procedure.
    Ignored,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes incoming calls to handlers operating on a context `C`.
pub struct RemoteCallDispatcher<C> {
    table: ProcedureTable,
    handlers: HashMap<ProcedureId, Box<dyn CallHandler<C>>>,
}

impl<C> RemoteCallDispatcher<C> {
    pub fn new() -> Self {
        Self {
            table: ProcedureTable::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a procedure this peer executes.
    pub fn register<H>(&mut self, spec: ProcedureSpec, handler: H) -> Result<ProcedureId, DispatchError>
    where
        H: CallHandler<C> + 'static,
    {
        self.register_boxed(spec, Box::new(handler))
    }

    /// Like [`register`](Self::register) for an already boxed handler.
    pub fn register_boxed(
        &mut self,
        spec: ProcedureSpec,
        handler: Box<dyn CallHandler<C>>,
    ) -> Result<ProcedureId, DispatchError> {
        let id = self.table.add(spec)?;
        self.handlers.insert(id, handler);
        Ok(id)
    }

    /// Declare a procedure this peer only sends.
    pub fn declare(&mut self, spec: ProcedureSpec) -> Result<ProcedureId, DispatchError> {
        self.table.add(spec)
    }

    pub fn table(&self) -> &ProcedureTable {
        &self.table
    }

    /// Invoke `name` with encoded `args` on behalf of `sender`.
    pub fn invoke(
        &self,
        name: &str,
        sender: SenderRole,
        ctx: &mut C,
        args: Bytes,
    ) -> Result<Dispatch, DispatchError> {
        let (id, _) = self
            .table
            .lookup(name)
            .ok_or_else(|| DispatchError::UnknownProcedure(name.to_string()))?;
        self.run(id, sender, ctx, WireReader::new(args))
    }

    /// Decode the id from a complete wire frame and invoke it.
    pub fn dispatch_frame(
        &self,
        frame: Bytes,
        sender: SenderRole,
        ctx: &mut C,
    ) -> Result<Dispatch, DispatchError> {
        let mut reader = WireReader::new(frame);
        let id = reader.read_u16().map_err(|source| DispatchError::Decode {
            procedure: "<frame>",
            source,
        })?;
        self.run(ProcedureId(id), sender, ctx, reader)
    }

    fn run(
        &self,
        id: ProcedureId,
        sender: SenderRole,
        ctx: &mut C,
        mut args: WireReader,
    ) -> Result<Dispatch, DispatchError> {
        let spec = self
            .table
            .spec(id)
            .ok_or(DispatchError::UnknownProcedureId(id.0))?;

        if !spec.direction.accepts(sender) {
            tracing::debug!(
                "Ignoring '{}' from {:?}: direction is {:?}",
                spec.name,
                sender,
                spec.direction
            );
            return Ok(Dispatch::Ignored);
        }

        let handler = self
            .handlers
            .get(&id)
            .ok_or(DispatchError::NoHandler(spec.name))?;
        handler
            .handle(ctx, &mut args)
            .map_err(|source| DispatchError::Decode {
                procedure: spec.name,
                source,
            })?;
        Ok(Dispatch::Executed)
    }
}

impl<C> Default for RemoteCallDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        hits: u32,
        last: i32,
    }

    fn bump(ctx: &mut Counter, args: &mut WireReader) -> Result<(), DecodeError> {
        ctx.last = args.read_i32()?;
        ctx.hits += 1;
        Ok(())
    }

    fn dispatcher() -> RemoteCallDispatcher<Counter> {
        let mut d = RemoteCallDispatcher::new();
        d.register(
            ProcedureSpec::new("kick", CallDirection::ServerToClient).priority(Priority::High),
            bump,
        )
        .unwrap();
        d.declare(ProcedureSpec::new("ping", CallDirection::ClientToServer))
            .unwrap();
        d.register(
            ProcedureSpec::new("effect", CallDirection::Both).unreliable(),
            bump,
        )
        .unwrap();
        d
    }

    fn args(v: i32) -> Bytes {
        let mut w = WireWriter::new();
        w.write_i32(v);
        w.finish()
    }

    #[test]
    fn test_direction_acceptance() {
        assert!(CallDirection::ServerToClient.accepts(SenderRole::Server));
        assert!(!CallDirection::ServerToClient.accepts(SenderRole::Client));
        assert!(CallDirection::ClientToServer.accepts(SenderRole::Client));
        assert!(!CallDirection::ClientToServer.accepts(SenderRole::Server));
        assert!(CallDirection::Both.accepts(SenderRole::Client));
        assert!(CallDirection::Both.accepts(SenderRole::Server));
    }

    #[test]
    fn test_invoke_runs_handler() {
        let d = dispatcher();
        let mut ctx = Counter::default();
        let result = d.invoke("kick", SenderRole::Server, &mut ctx, args(7)).unwrap();
        assert_eq!(result, Dispatch::Executed);
        assert_eq!(ctx.hits, 1);
        assert_eq!(ctx.last, 7);
    }

    #[test]
    fn test_spoofed_authority_is_ignored() {
        let d = dispatcher();
        let mut ctx = Counter::default();
        let result = d.invoke("kick", SenderRole::Client, &mut ctx, args(7)).unwrap();
        assert_eq!(result, Dispatch::Ignored);
        assert_eq!(ctx.hits, 0);
    }

    #[test]
    fn test_unknown_procedure_is_error() {
        let d = dispatcher();
        let mut ctx = Counter::default();
        let err = d
            .invoke("nope", SenderRole::Server, &mut ctx, Bytes::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownProcedure(name) if name == "nope"));
    }

    #[test]
    fn test_declared_only_procedure_has_no_handler() {
        let d = dispatcher();
        let mut ctx = Counter::default();
        let err = d
            .invoke("ping", SenderRole::Client, &mut ctx, Bytes::new())
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoHandler("ping")));
    }

    #[test]
    fn test_frame_roundtrip_through_table() {
        let d = dispatcher();
        let call = d.table().encode("effect", &args(-3)).unwrap();
        assert_eq!(call.reliability, Reliability::Unreliable);
        assert_eq!(&call.frame[..2], &[0, 2]);

        let mut ctx = Counter::default();
        let result = d
            .dispatch_frame(call.frame, SenderRole::Client, &mut ctx)
            .unwrap();
        assert_eq!(result, Dispatch::Executed);
        assert_eq!(ctx.last, -3);
    }

    #[test]
    fn test_truncated_arguments_surface_as_decode_error() {
        let d = dispatcher();
        let mut ctx = Counter::default();
        let err = d
            .invoke("kick", SenderRole::Server, &mut ctx, Bytes::from_static(&[0, 1]))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Decode { procedure: "kick", .. }));
        assert_eq!(ctx.hits, 0);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut d = dispatcher();
        let err = d
            .declare(ProcedureSpec::new("kick", CallDirection::ServerToClient))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Duplicate("kick")));
    }

    #[test]
    fn test_unknown_frame_id() {
        let d = dispatcher();
        let mut ctx = Counter::default();
        let err = d
            .dispatch_frame(Bytes::from_static(&[0, 99]), SenderRole::Server, &mut ctx)
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownProcedureId(99)));
    }
}
