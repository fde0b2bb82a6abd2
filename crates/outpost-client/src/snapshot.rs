//! Decoding of entity, block, and world-state snapshots.
//!
//! Snapshots arrive on the unreliable channel and may be lost, duplicated or
//! reordered. Each batch is applied record by record; a decode failure stops
//! the batch at that record, keeps everything applied before it, and is
//! logged rather than propagated. The connection is never torn down because
//! of a bad snapshot.
//!
//! Batch layouts:
//!
//! ```text
//! entity record: id:i32 | type_tag:u8 | payload (entity read contract)
//! block record:  pos:i32 | block_id:u16 | payload (building read contract)
//! core data:     teams:u8 | { team:u8 | count:u16 | { item:u16 | amount:i32 } }
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use rustc_hash::FxHashSet;

use outpost_net::{DecodeError, WireReader, WireWriter};

use crate::collab::{EntityDirectory, SyncEntity, WorldAccess};
use crate::events::ClientEvent;
use crate::game::{GamePhase, GameState};

// ---------------------------------------------------------------------------
// Entity types
// ---------------------------------------------------------------------------

/// Constructs an empty entity with the given id.
pub type EntityConstructor = fn(i32) -> Box<dyn SyncEntity>;

/// Maps numeric type tags to entity constructors. Filled once at startup.
#[derive(Default, Clone)]
pub struct EntityTypeRegistry {
    constructors: HashMap<u8, EntityConstructor>,
}

impl EntityTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ctor` for `tag`, replacing any previous entry.
    pub fn register(&mut self, tag: u8, ctor: EntityConstructor) -> &mut Self {
        self.constructors.insert(tag, ctor);
        self
    }

    pub fn contains(&self, tag: u8) -> bool {
        self.constructors.contains_key(&tag)
    }

    /// Instantiate an entity of type `tag`.
    pub fn create(&self, tag: u8, id: i32) -> Result<Box<dyn SyncEntity>, DecodeError> {
        self.constructors
            .get(&tag)
            .map(|ctor| ctor(id))
            .ok_or(DecodeError::UnknownTypeTag(tag))
    }
}

impl std::fmt::Debug for EntityTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<_> = self.constructors.keys().copied().collect();
        tags.sort_unstable();
        f.debug_struct("EntityTypeRegistry").field("tags", &tags).finish()
    }
}

// ---------------------------------------------------------------------------
// RemovedIds
// ---------------------------------------------------------------------------

/// Ids of entities this client has already materialized.
///
/// A snapshot that describes an id in this set but absent from the
/// directory is stale (the entity was removed, or its birth was already
/// handled) and must not add the entity again.
#[derive(Debug, Default, Clone)]
pub struct RemovedIds {
    ids: FxHashSet<i32>,
}

impl RemovedIds {
    pub fn insert(&mut self, id: i32) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: i32) {
        self.ids.remove(&id);
    }

    pub fn contains(&self, id: i32) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Item counts held by a team's core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemStock {
    /// `(item id, amount)` pairs in wire order.
    pub items: Vec<(u16, i32)>,
}

impl ItemStock {
    pub fn read(input: &mut WireReader) -> Result<Self, DecodeError> {
        let count = input.read_u16()?;
        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let item = input.read_u16()?;
            let amount = input.read_i32()?;
            items.push((item, amount));
        }
        Ok(Self { items })
    }

    pub fn write(&self, out: &mut WireWriter) {
        let count = u16::try_from(self.items.len()).unwrap_or(u16::MAX);
        out.write_u16(count);
        for &(item, amount) in self.items.iter().take(count as usize) {
            out.write_u16(item).write_i32(amount);
        }
    }

    pub fn amount(&self, item: u16) -> Option<i32> {
        self.items.iter().find(|(id, _)| *id == item).map(|(_, a)| *a)
    }
}

/// Scalar world state plus per-team core inventories.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub wave_time: f32,
    pub wave: i32,
    pub enemies: i32,
    pub paused: bool,
    pub game_over: bool,
    pub time_data: i32,
    pub tps: u8,
    pub rand: [i64; 2],
    /// Encoded core inventories, see the module docs.
    pub core_data: Bytes,
}

impl StateSnapshot {
    /// Decode the procedure arguments.
    pub fn read(input: &mut WireReader) -> Result<Self, DecodeError> {
        Ok(Self {
            wave_time: input.read_f32()?,
            wave: input.read_i32()?,
            enemies: input.read_i32()?,
            paused: input.read_bool()?,
            game_over: input.read_bool()?,
            time_data: input.read_i32()?,
            tps: input.read_u8()?,
            rand: [input.read_i64()?, input.read_i64()?],
            core_data: input.read_bytes()?,
        })
    }

    pub fn write(&self, out: &mut WireWriter) {
        out.write_f32(self.wave_time)
            .write_i32(self.wave)
            .write_i32(self.enemies)
            .write_bool(self.paused)
            .write_bool(self.game_over)
            .write_i32(self.time_data)
            .write_u8(self.tps)
            .write_i64(self.rand[0])
            .write_i64(self.rand[1])
            .write_bytes(&self.core_data);
    }
}

/// Encode core inventories as carried in [`StateSnapshot::core_data`].
pub fn encode_core_data(teams: &[(u8, ItemStock)]) -> Bytes {
    let mut out = WireWriter::new();
    let count = u8::try_from(teams.len()).unwrap_or(u8::MAX);
    out.write_u8(count);
    for (team, stock) in teams.iter().take(count as usize) {
        out.write_u8(*team);
        stock.write(&mut out);
    }
    out.finish()
}

// ---------------------------------------------------------------------------
// SnapshotDecoder
// ---------------------------------------------------------------------------

/// Applies snapshot batches to the entity directory and world.
#[derive(Debug, Default)]
pub struct SnapshotDecoder {
    types: EntityTypeRegistry,
    removed: RemovedIds,
    input: WireReader,
    /// Suppresses join notifications during a bulk initial sync.
    pub syncing: bool,
}

impl SnapshotDecoder {
    pub fn new(types: EntityTypeRegistry) -> Self {
        Self {
            types,
            ..Self::default()
        }
    }

    pub fn removed(&self) -> &RemovedIds {
        &self.removed
    }

    pub fn removed_mut(&mut self) -> &mut RemovedIds {
        &mut self.removed
    }

    /// Forget every materialized id. Called on every full reset.
    pub fn clear(&mut self) {
        self.removed.clear();
        self.syncing = false;
    }

    /// Apply an entity batch. Returns the number of records applied.
    pub fn apply_entities(
        &mut self,
        amount: u16,
        data: Bytes,
        entities: &mut dyn EntityDirectory,
        events: &mut Vec<ClientEvent>,
    ) -> usize {
        self.input.reset(data);
        let mut applied = 0;
        for _ in 0..amount {
            if let Err(e) = self.read_entity(entities, events) {
                tracing::error!("Error reading entity snapshot: {e}");
                break;
            }
            applied += 1;
        }
        applied
    }

    fn read_entity(
        &mut self,
        entities: &mut dyn EntityDirectory,
        events: &mut Vec<ClientEvent>,
    ) -> Result<(), DecodeError> {
        let id = self.input.read_i32()?;
        let tag = self.input.read_u8()?;

        if let Some(entity) = entities.get_mut(id) {
            return entity.read_sync(&mut self.input);
        }

        if entities.local_player_id() == Some(id)
            && let Some(local) = entities.attach_local_player()
        {
            local.read_sync(&mut self.input)?;
            let is_player = local.is_player();
            self.materialized(id, is_player, events);
            return Ok(());
        }

        let mut entity = self.types.create(tag, id)?;
        entity.read_sync(&mut self.input)?;
        entity.snap_sync();

        if self.removed.contains(id) {
            // Already born once; this record is stale.
            return Ok(());
        }
        let is_player = entity.is_player();
        entities.add(entity);
        self.materialized(id, is_player, events);
        Ok(())
    }

    fn materialized(&mut self, id: i32, is_player: bool, events: &mut Vec<ClientEvent>) {
        self.removed.insert(id);
        if is_player && !self.syncing {
            events.push(ClientEvent::PlayerJoined { id });
        }
    }

    /// Tell every listed entity that the server stopped updating it.
    pub fn apply_hidden(&mut self, ids: &[i32], entities: &mut dyn EntityDirectory) {
        for &id in ids {
            if let Some(entity) = entities.get_mut(id) {
                entity.handle_sync_hidden();
            }
        }
    }

    /// A player left: announce it, remember the id, and drop the entity.
    pub fn entity_disconnected(
        &mut self,
        id: i32,
        entities: &mut dyn EntityDirectory,
        events: &mut Vec<ClientEvent>,
    ) {
        events.push(ClientEvent::PlayerLeft { id });
        self.removed.insert(id);
        entities.remove(id);
    }

    /// Apply a block batch. Stops at the first tile whose building is missing
    /// or of a different block type. Returns the number of records applied.
    pub fn apply_blocks(&mut self, amount: u16, data: Bytes, world: &mut dyn WorldAccess) -> usize {
        self.input.reset(data);
        let mut applied = 0;
        for _ in 0..amount {
            match self.read_block(world) {
                Ok(true) => applied += 1,
                Ok(false) => break,
                Err(e) => {
                    tracing::error!("Error reading block snapshot: {e}");
                    break;
                }
            }
        }
        applied
    }

    fn read_block(&mut self, world: &mut dyn WorldAccess) -> Result<bool, DecodeError> {
        let pos = self.input.read_i32()?;
        let block = self.input.read_u16()?;

        let Some(building) = world.building_mut(pos) else {
            tracing::warn!("Missing building at {pos}. Skipping block snapshot.");
            return Ok(false);
        };
        if building.block_id() != block {
            tracing::warn!(
                "Block ID mismatch at {pos}: {} != {block}. Skipping block snapshot.",
                building.block_id()
            );
            return Ok(false);
        }
        building.read_sync(&mut self.input)?;
        Ok(true)
    }

    /// Apply a world-state snapshot.
    pub fn apply_state(
        &mut self,
        snapshot: StateSnapshot,
        game: &mut GameState,
        world: &mut dyn WorldAccess,
        events: &mut Vec<ClientEvent>,
    ) {
        if snapshot.wave > game.wave {
            events.push(ClientEvent::WaveChanged { wave: snapshot.wave });
        }

        game.game_over = snapshot.game_over;
        game.wave_time = snapshot.wave_time;
        game.wave = snapshot.wave;
        game.enemies = snapshot.enemies;
        if game.is_game() {
            game.phase = if snapshot.paused {
                GamePhase::Paused
            } else {
                GamePhase::Playing
            };
        }
        game.server_tps = snapshot.tps;
        game.rand_seeds = snapshot.rand;
        game.net_seconds = snapshot.time_data;

        if let Err(e) = self.read_core_data(snapshot.core_data, world) {
            tracing::error!("Error reading core data in state snapshot: {e}");
        }
    }

    fn read_core_data(&mut self, data: Bytes, world: &mut dyn WorldAccess) -> Result<(), DecodeError> {
        self.input.reset(data);
        let teams = self.input.read_u8()?;
        for _ in 0..teams {
            let team = self.input.read_u8()?;
            let stock = ItemStock::read(&mut self.input)?;
            world.set_core_items(team, stock);
        }
        Ok(())
    }
}
