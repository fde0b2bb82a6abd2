//! Headless Outpost client.
//!
//! Connects to a server over TCP, keeps the session alive on a fixed tick,
//! and relays console input as chat.

pub mod game_loop;
pub mod session;

/// Protocol version announced in the handshake.
pub const GAME_VERSION: i32 = 146;
