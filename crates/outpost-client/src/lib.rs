//! Client-side session layer: connection lifecycle, snapshot decoding,
//! periodic state emission, and chat processing.
//!
//! The core is synchronous and I/O free. A host feeds it
//! [`TransportEvent`](outpost_net::TransportEvent)s and ticks, then drains the
//! queued transport commands and client events.

pub mod chat;
pub mod client;
pub mod collab;
pub mod custom;
pub mod emitter;
pub mod events;
pub mod game;
mod handlers;
pub mod handshake;
pub mod lifecycle;
pub mod memory;
pub mod protocol;
pub mod snapshot;

pub use chat::{ChatGate, ChatMessage, ChatPipeline, ClickAction, ClickRegion};
pub use client::{ClientCore, Collaborators, NetClient};
pub use events::{ClientEvent, DisconnectTitle, ErrorNotice, Notice};
pub use game::{GamePhase, GameState};
pub use handshake::{Handshake, HandshakeError};
pub use lifecycle::{Connection, ConnectionState, KickReason};
pub use snapshot::{EntityTypeRegistry, SnapshotDecoder, StateSnapshot};
