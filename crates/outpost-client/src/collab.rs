//! Contracts for the external systems the client core consults.
//!
//! Entity storage, tile storage, the local player, identity and time all
//! live outside this crate. The core reaches them only through these traits,
//! always from the simulation thread, so none of them need interior locking.
//! In-memory implementations live in [`crate::memory`].

use std::any::Any;

use glam::Vec2;
use outpost_net::{DecodeError, WireReader};

use crate::snapshot::ItemStock;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Display details of an entity that can author chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatIdentity {
    /// Name including color tags.
    pub colored_name: String,
    /// Team color as an eight-digit hex string (`rrggbbaa`).
    pub team_color: String,
}

/// A remote-controlled object with a binary read contract.
pub trait SyncEntity: Any + Send {
    /// Stable network id.
    fn id(&self) -> i32;

    /// Numeric type tag this entity was created from.
    fn type_tag(&self) -> u8;

    /// Apply one snapshot payload.
    fn read_sync(&mut self, input: &mut WireReader) -> Result<(), DecodeError>;

    /// Jump interpolation state to the values just read.
    fn snap_sync(&mut self);

    /// The server stopped sending updates for this entity.
    fn handle_sync_hidden(&mut self) {}

    /// Returns `true` for player entities.
    fn is_player(&self) -> bool {
        false
    }

    /// Chat display details, for player entities.
    fn chat_identity(&self) -> Option<ChatIdentity> {
        None
    }
}

/// Lookup-by-id storage for synchronized entities.
///
/// The local player's entity is owned by the directory but survives
/// [`clear`](EntityDirectory::clear): it is detached rather than dropped and
/// re-attached the next time a snapshot mentions its id.
pub trait EntityDirectory: Any {
    fn get(&self, id: i32) -> Option<&(dyn SyncEntity + 'static)>;

    fn get_mut(&mut self, id: i32) -> Option<&mut (dyn SyncEntity + 'static)>;

    /// Add an entity to the world.
    fn add(&mut self, entity: Box<dyn SyncEntity>);

    fn remove(&mut self, id: i32) -> Option<Box<dyn SyncEntity>>;

    /// Remove every entity, detaching the local player's.
    fn clear(&mut self);

    /// Id of the local player's entity, if one exists.
    fn local_player_id(&self) -> Option<i32>;

    /// Move the detached local player entity into the world and return it.
    /// Returns `None` if there is no local player entity.
    fn attach_local_player(&mut self) -> Option<&mut (dyn SyncEntity + 'static)>;

    fn contains(&self, id: i32) -> bool {
        self.get(id).is_some()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A building occupying a tile.
pub trait SyncBuilding {
    /// Id of the block type this building is an instance of.
    fn block_id(&self) -> u16;

    /// Apply one block snapshot payload.
    fn read_sync(&mut self, input: &mut WireReader) -> Result<(), DecodeError>;
}

/// Error returned when a downloaded world cannot be loaded.
#[derive(Debug, thiserror::Error)]
#[error("world load failed: {0}")]
pub struct WorldLoadError(pub String);

/// Tile and team storage.
pub trait WorldAccess: Any {
    /// Building at packed tile position `pos`, if the tile exists and has one.
    fn building_mut(&mut self, pos: i32) -> Option<&mut dyn SyncBuilding>;

    /// Replace the core inventory of `team`. Returns `false` if the team has
    /// no core, in which case the stock is discarded.
    fn set_core_items(&mut self, team: u8, stock: ItemStock) -> bool;

    /// Load a decompressed world download.
    fn load(&mut self, data: &[u8]) -> Result<(), WorldLoadError>;

    /// Drop all tiles and team data.
    fn clear(&mut self);
}

// ---------------------------------------------------------------------------
// Local player
// ---------------------------------------------------------------------------

/// The unit the local player controls.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitState {
    pub id: i32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    /// Chassis heading for units whose base turns independently.
    pub base_rotation: Option<f32>,
}

/// One entry of the build queue.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlan {
    /// Packed tile position.
    pub tile: i32,
    pub breaking: bool,
    pub block: u16,
    pub rotation: u8,
}

/// Camera viewport in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub center: Vec2,
    pub size: Vec2,
}

/// Everything the state emitter reports about the local player.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerState {
    /// Controlled unit, `None` while dead.
    pub unit: Option<UnitState>,
    /// Last known player position, reported while dead.
    pub position: Vec2,
    pub aim: Vec2,
    /// Tile being mined, as a packed position.
    pub mine_tile: Option<i32>,
    pub boosting: bool,
    pub shooting: bool,
    pub typing: bool,
    pub building: bool,
    /// Build queue, present only when the player may build.
    pub build_plans: Option<Vec<BuildPlan>>,
    pub camera: Viewport,
}

/// The local player as seen by the network layer.
pub trait LocalPlayer: Any {
    fn state(&self) -> PlayerState;

    /// Server-forced move of the player and its unit.
    fn set_position(&mut self, position: Vec2);

    fn set_camera_position(&mut self, position: Vec2);

    /// Drop session-scoped changes (admin flag, server-assigned name).
    fn reset_session(&mut self) {}
}

// ---------------------------------------------------------------------------
// Identity and time
// ---------------------------------------------------------------------------

/// Identity fields for the handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    /// RGBA8888.
    pub color: u32,
    pub locale: String,
    pub mods: Vec<String>,
    pub mobile: bool,
    pub version_type: String,
    pub version: i32,
}

pub trait IdentitySource {
    fn profile(&self) -> Profile;

    /// Stable device identifier. `None` aborts the handshake.
    fn device_id(&self) -> Option<String>;

    /// Persisted random token for `endpoint` (`ip:port`).
    fn session_token(&mut self, endpoint: &str) -> String;
}

/// Wall clock in milliseconds, used for latency probes.
pub trait Clock {
    fn now_millis(&self) -> i64;
}
