//! Global simulation state mirrored from the server.

use std::collections::BTreeSet;

use bytes::Bytes;

/// Coarse phase of the local simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// No world loaded.
    #[default]
    Menu,
    Playing,
    Paused,
}

/// World-level values written by state snapshots and rule updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameState {
    pub phase: GamePhase,
    pub wave: i32,
    /// Ticks until the next wave.
    pub wave_time: f32,
    pub enemies: i32,
    pub game_over: bool,
    /// Server simulation rate as reported by the last snapshot.
    pub server_tps: u8,
    /// Server random generator state.
    pub rand_seeds: [i64; 2],
    /// Server universe clock in seconds.
    pub net_seconds: i32,
    /// Encoded rule set, opaque to the network layer.
    pub rules: Option<Bytes>,
    /// Encoded map objectives, opaque to the network layer.
    pub objectives: Option<Bytes>,
    pub objective_flags: BTreeSet<String>,
}

impl GameState {
    /// Back to the menu with everything cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` unless the phase is [`GamePhase::Menu`].
    pub fn is_game(&self) -> bool {
        self.phase != GamePhase::Menu
    }

    /// Remove `removed` then add `added` to the objective flags.
    pub fn apply_flag_delta(&mut self, removed: &[String], added: &[String]) {
        for flag in removed {
            self.objective_flags.remove(flag);
        }
        self.objective_flags.extend(added.iter().cloned());
    }
}
