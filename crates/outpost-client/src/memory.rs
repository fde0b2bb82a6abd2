//! In-memory collaborators.
//!
//! Minimal implementations of the [`collab`](crate::collab) traits, used by
//! the headless client and by tests. They store just enough state to observe
//! what the network layer did.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use glam::Vec2;
use rustc_hash::FxHashMap;

use outpost_config::IdentityConfig;
use outpost_net::{DecodeError, WireReader, WireWriter};

use crate::collab::{
    ChatIdentity, Clock, EntityDirectory, IdentitySource, LocalPlayer, PlayerState, Profile,
    SyncBuilding, SyncEntity, UnitState, WorldAccess, WorldLoadError,
};
use crate::snapshot::{EntityTypeRegistry, ItemStock};

/// Type tag of [`BasicUnit`].
pub const UNIT_TAG: u8 = 1;
/// Type tag of [`BasicPlayer`].
pub const PLAYER_TAG: u8 = 2;

/// A registry with [`BasicUnit`] and [`BasicPlayer`].
pub fn standard_types() -> EntityTypeRegistry {
    let mut types = EntityTypeRegistry::new();
    types
        .register(UNIT_TAG, |id| Box::new(BasicUnit::new(id)))
        .register(PLAYER_TAG, |id| Box::new(BasicPlayer::new(id)));
    types
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A unit with a position and heading. Payload: `x:f32 | y:f32 | rotation:f32`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicUnit {
    pub id: i32,
    pub position: Vec2,
    pub rotation: f32,
    /// Interpolated position; jumps to `position` on snap.
    pub rendered: Vec2,
    pub hidden: bool,
}

impl BasicUnit {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

impl SyncEntity for BasicUnit {
    fn id(&self) -> i32 {
        self.id
    }

    fn type_tag(&self) -> u8 {
        UNIT_TAG
    }

    fn read_sync(&mut self, input: &mut WireReader) -> Result<(), DecodeError> {
        let x = input.read_f32()?;
        let y = input.read_f32()?;
        self.rotation = input.read_f32()?;
        self.position = Vec2::new(x, y);
        self.hidden = false;
        Ok(())
    }

    fn snap_sync(&mut self) {
        self.rendered = self.position;
    }

    fn handle_sync_hidden(&mut self) {
        self.hidden = true;
    }
}

/// A player. Payload: `name:str | team_color:str | x:f32 | y:f32`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicPlayer {
    pub id: i32,
    pub name: String,
    pub team_color: String,
    pub position: Vec2,
    pub rendered: Vec2,
}

impl BasicPlayer {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

impl SyncEntity for BasicPlayer {
    fn id(&self) -> i32 {
        self.id
    }

    fn type_tag(&self) -> u8 {
        PLAYER_TAG
    }

    fn read_sync(&mut self, input: &mut WireReader) -> Result<(), DecodeError> {
        self.name = input.read_str()?;
        self.team_color = input.read_str()?;
        let x = input.read_f32()?;
        let y = input.read_f32()?;
        self.position = Vec2::new(x, y);
        Ok(())
    }

    fn snap_sync(&mut self) {
        self.rendered = self.position;
    }

    fn is_player(&self) -> bool {
        true
    }

    fn chat_identity(&self) -> Option<ChatIdentity> {
        Some(ChatIdentity {
            colored_name: self.name.clone(),
            team_color: self.team_color.clone(),
        })
    }
}

/// Entity storage keyed by id, with a detachable local player.
#[derive(Default)]
pub struct EntityMap {
    entities: FxHashMap<i32, Box<dyn SyncEntity>>,
    local_id: Option<i32>,
    detached_local: Option<Box<dyn SyncEntity>>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map whose local player entity starts detached.
    pub fn with_local_player(id: i32, name: &str) -> Self {
        let mut player = BasicPlayer::new(id);
        player.name = name.to_string();
        Self {
            local_id: Some(id),
            detached_local: Some(Box::new(player)),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn downcast<T: SyncEntity>(&self, id: i32) -> Option<&T> {
        let entity: &dyn Any = &**self.entities.get(&id)?;
        entity.downcast_ref::<T>()
    }

    pub fn unit(&self, id: i32) -> Option<&BasicUnit> {
        self.downcast(id)
    }

    pub fn player(&self, id: i32) -> Option<&BasicPlayer> {
        self.downcast(id)
    }
}

impl EntityDirectory for EntityMap {
    fn get(&self, id: i32) -> Option<&(dyn SyncEntity + 'static)> {
        self.entities.get(&id).map(|e| &**e)
    }

    fn get_mut(&mut self, id: i32) -> Option<&mut (dyn SyncEntity + 'static)> {
        self.entities.get_mut(&id).map(|e| &mut **e)
    }

    fn add(&mut self, entity: Box<dyn SyncEntity>) {
        self.entities.insert(entity.id(), entity);
    }

    fn remove(&mut self, id: i32) -> Option<Box<dyn SyncEntity>> {
        let entity = self.entities.remove(&id)?;
        if self.local_id == Some(id) {
            self.detached_local = Some(entity);
            return None;
        }
        Some(entity)
    }

    fn clear(&mut self) {
        if let Some(id) = self.local_id
            && let Some(local) = self.entities.remove(&id)
        {
            self.detached_local = Some(local);
        }
        self.entities.clear();
    }

    fn local_player_id(&self) -> Option<i32> {
        self.local_id
    }

    fn attach_local_player(&mut self) -> Option<&mut (dyn SyncEntity + 'static)> {
        let id = self.local_id?;
        if let Some(local) = self.detached_local.take() {
            self.entities.insert(id, local);
        }
        self.get_mut(id)
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A building with health. Payload: `health:f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBuilding {
    pub block: u16,
    pub health: f32,
}

impl BasicBuilding {
    pub fn new(block: u16) -> Self {
        Self { block, health: 0.0 }
    }
}

impl SyncBuilding for BasicBuilding {
    fn block_id(&self) -> u16 {
        self.block
    }

    fn read_sync(&mut self, input: &mut WireReader) -> Result<(), DecodeError> {
        self.health = input.read_f32()?;
        Ok(())
    }
}

/// Sparse tile storage plus team cores.
///
/// World downloads use the layout
/// `count:u16 | { pos:i32 | block:u16 } | teams:u8 | { team:u8 }`,
/// see [`encode_world`].
#[derive(Debug, Default)]
pub struct TileGrid {
    buildings: FxHashMap<i32, BasicBuilding>,
    cores: HashMap<u8, ItemStock>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, pos: i32, building: BasicBuilding) {
        self.buildings.insert(pos, building);
    }

    pub fn building(&self, pos: i32) -> Option<&BasicBuilding> {
        self.buildings.get(&pos)
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Give `team` an empty core.
    pub fn add_core(&mut self, team: u8) {
        self.cores.entry(team).or_default();
    }

    pub fn core_items(&self, team: u8) -> Option<&ItemStock> {
        self.cores.get(&team)
    }
}

impl WorldAccess for TileGrid {
    fn building_mut(&mut self, pos: i32) -> Option<&mut dyn SyncBuilding> {
        self.buildings
            .get_mut(&pos)
            .map(|b| b as &mut dyn SyncBuilding)
    }

    fn set_core_items(&mut self, team: u8, stock: ItemStock) -> bool {
        match self.cores.get_mut(&team) {
            Some(items) => {
                *items = stock;
                true
            }
            None => false,
        }
    }

    fn load(&mut self, data: &[u8]) -> Result<(), WorldLoadError> {
        let mut input = WireReader::new(Bytes::copy_from_slice(data));
        let parse = |input: &mut WireReader| -> Result<TileGrid, DecodeError> {
            let mut grid = TileGrid::new();
            let count = input.read_u16()?;
            for _ in 0..count {
                let pos = input.read_i32()?;
                let block = input.read_u16()?;
                grid.place(pos, BasicBuilding::new(block));
            }
            let teams = input.read_u8()?;
            for _ in 0..teams {
                grid.add_core(input.read_u8()?);
            }
            Ok(grid)
        };
        *self = parse(&mut input).map_err(|e| WorldLoadError(e.to_string()))?;
        Ok(())
    }

    fn clear(&mut self) {
        self.buildings.clear();
        self.cores.clear();
    }
}

/// Encode a world download for [`TileGrid::load`].
pub fn encode_world(buildings: &[(i32, u16)], core_teams: &[u8]) -> Bytes {
    let mut out = WireWriter::new();
    out.write_u16(buildings.len() as u16);
    for &(pos, block) in buildings {
        out.write_i32(pos).write_u16(block);
    }
    out.write_u8(core_teams.len() as u8);
    for &team in core_teams {
        out.write_u8(team);
    }
    out.finish()
}

// ---------------------------------------------------------------------------
// Local player
// ---------------------------------------------------------------------------

/// A local player whose state is set directly by the host.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlayer {
    pub state: PlayerState,
}

impl ScriptedPlayer {
    /// A live player controlling unit `unit_id` at `position`.
    pub fn alive(unit_id: i32, position: Vec2) -> Self {
        Self {
            state: PlayerState {
                unit: Some(UnitState {
                    id: unit_id,
                    position,
                    velocity: Vec2::ZERO,
                    rotation: 0.0,
                    base_rotation: None,
                }),
                position,
                ..PlayerState::default()
            },
        }
    }
}

impl LocalPlayer for ScriptedPlayer {
    fn state(&self) -> PlayerState {
        self.state.clone()
    }

    fn set_position(&mut self, position: Vec2) {
        self.state.position = position;
        if let Some(unit) = self.state.unit.as_mut() {
            unit.position = position;
        }
    }

    fn set_camera_position(&mut self, position: Vec2) {
        self.state.camera.center = position;
    }
}

// ---------------------------------------------------------------------------
// Identity and time
// ---------------------------------------------------------------------------

/// Identity backed by configuration, with per-endpoint tokens kept in memory.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    profile: Profile,
    device_id: Option<String>,
    tokens: HashMap<String, String>,
}

impl StaticIdentity {
    pub fn new(profile: Profile, device_id: Option<String>) -> Self {
        Self {
            profile,
            device_id,
            tokens: HashMap::new(),
        }
    }

    /// Profile from config with a freshly generated device id.
    pub fn from_config(config: &IdentityConfig, version: i32) -> Self {
        let profile = Profile {
            name: config.name.clone(),
            color: config.color,
            locale: config.locale.clone(),
            mods: Vec::new(),
            mobile: config.mobile,
            version_type: "official".to_string(),
            version,
        };
        Self::new(profile, Some(random_token()))
    }
}

impl IdentitySource for StaticIdentity {
    fn profile(&self) -> Profile {
        self.profile.clone()
    }

    fn device_id(&self) -> Option<String> {
        self.device_id.clone()
    }

    fn session_token(&mut self, endpoint: &str) -> String {
        self.tokens
            .entry(endpoint.to_string())
            .or_insert_with(random_token)
            .clone()
    }
}

/// Eight random bytes, base64 encoded.
pub fn random_token() -> String {
    let bytes: [u8; 8] = rand::random();
    general_purpose::STANDARD.encode(bytes)
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}
