//! Boundary types between a transport and the simulation thread.
//!
//! A transport turns socket activity into [`TransportEvent`]s and executes
//! [`TransportCommand`]s. The client core consumes the former and produces
//! the latter without ever touching a socket.

use bytes::Bytes;

use crate::dispatch::OutgoingCall;

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The transport-level connection is up. `address` has the form
    /// `host/ip:port` (host may be empty).
    Connected { address: String },
    /// The connection is gone. `reason` is `"closed"`, `"timeout"`, another
    /// machine-readable string, or `None` for a local close.
    Disconnected { reason: Option<String> },
    /// The compressed initial world payload.
    WorldStream(Bytes),
    /// A remote-call frame.
    Call(Bytes),
}

/// Something the simulation wants the transport to do.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    /// Open a new connection.
    Connect { address: String, port: u16 },
    /// Send an encoded call.
    Send(OutgoingCall),
    /// Close the current connection. The transport answers with
    /// [`TransportEvent::Disconnected`].
    Disconnect,
    /// Tell the peer whether the client finished loading the world.
    SetClientLoaded(bool),
}

/// Extracts the bare host from a transport address: everything after the
/// last `/`, without the `:port` suffix.
///
/// `"example.org/10.0.0.5:6567"` and `"/10.0.0.5:6567"` both yield
/// `"10.0.0.5"`; `"/[::1]:6567"` yields `"::1"`.
pub fn host_of(address: &str) -> &str {
    let endpoint = endpoint_of(address);
    if let Some(bracketed) = endpoint.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or(bracketed);
    }
    match endpoint.rsplit_once(':') {
        // More than one colon and no brackets: a bare IPv6 literal.
        Some((host, _)) if !host.contains(':') => host,
        _ => endpoint,
    }
}

/// Like [`host_of`] but keeps the port, giving a stable per-endpoint key.
pub fn endpoint_of(address: &str) -> &str {
    address.rsplit('/').next().unwrap_or(address)
}
