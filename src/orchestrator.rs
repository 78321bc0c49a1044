//! Chunk lifecycle coordination.
//!
//! A single coordinator owns every [`ChunkData`]; worker pools receive
//! serialized buffer copies and hand back an updated center buffer that the
//! coordinator reinstates. The pipeline chains terrain -> lighting ->
//! meshing, with a per-frame wall-clock budget on dirty mesh dispatch and a
//! periodic unload sweep around the observer.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use bitflags::bitflags;
use glam::Vec3;
use tracing::{debug, warn};

use voxelforge_assets::BlockRegistry;
use voxelforge_mesh::{mesh_chunk, ChunkMeshData, ChunkView, MeshHash};
use voxelforge_world::{
    flood_light, occlude_sky, BlockId, ChunkData, ChunkNeighborhood, ChunkPos, FloodStats,
    LightValue, TerrainGenerator, WorldError, BLOCK_AIR, CHUNK_SIZE_X, CHUNK_SIZE_Y,
    CHUNK_SIZE_Z,
};

use crate::config::EngineConfig;
use crate::events::{EventBus, WorldEvent};
use crate::query::{LightingQuery, VoxelQuery, AIR_ABSENT};
use crate::workers::WorkerPool;
use crate::EngineError;

bitflags! {
    /// Pipeline stages a resident chunk has completed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct ChunkStage: u8 {
        const GENERATED = 0b0000_0001;
        const LIT = 0b0000_0010;
        const MESHED = 0b0000_0100;
    }
}

struct ChunkEntry {
    data: ChunkData,
    stages: ChunkStage,
    mesh_hash: Option<MeshHash>,
    /// Sum of all light nibbles after the last lighting pass. A pass that
    /// grows this total may brighten neighbor seams, so those re-light.
    light_sum: u64,
}

impl ChunkEntry {
    fn new(data: ChunkData) -> Self {
        Self {
            data,
            stages: ChunkStage::GENERATED,
            mesh_hash: None,
            light_sum: 0,
        }
    }
}

/// Total of the four light nibbles across a chunk (the top 16 bits of each
/// packed word).
fn light_sum(data: &ChunkData) -> u64 {
    data.words().iter().map(|word| u64::from(word >> 16)).sum()
}

/// Why a chunk is queued for a mesh rebuild. Block edits outrank lighting
/// updates, which outrank global sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DirtyReason {
    Global,
    Light,
    Block,
}

/// Insertion-ordered dirty set with the reason escalation rule: an entry
/// already marked by a block edit is never downgraded; otherwise the newer
/// reason overwrites.
#[derive(Default)]
struct DirtyQueue {
    order: VecDeque<ChunkPos>,
    reasons: HashMap<ChunkPos, DirtyReason>,
}

impl DirtyQueue {
    fn mark(&mut self, coord: ChunkPos, reason: DirtyReason) {
        match self.reasons.get_mut(&coord) {
            Some(existing) => {
                if *existing != DirtyReason::Block {
                    *existing = reason;
                }
            }
            None => {
                self.order.push_back(coord);
                self.reasons.insert(coord, reason);
            }
        }
    }

    /// Re-insert an entry popped but not dispatched, keeping its reason.
    fn requeue_back(&mut self, coord: ChunkPos, reason: DirtyReason) {
        if !self.reasons.contains_key(&coord) {
            self.order.push_back(coord);
            self.reasons.insert(coord, reason);
        }
    }

    fn pop_front(&mut self) -> Option<(ChunkPos, DirtyReason)> {
        let coord = self.order.pop_front()?;
        let reason = self
            .reasons
            .remove(&coord)
            .expect("dirty queue order and reasons stay in sync");
        Some((coord, reason))
    }

    fn remove(&mut self, coord: ChunkPos) {
        if self.reasons.remove(&coord).is_some() {
            self.order.retain(|c| *c != coord);
        }
    }

    fn reason(&self, coord: ChunkPos) -> Option<DirtyReason> {
        self.reasons.get(&coord).copied()
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Commands collaborators send into the world core.
#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Load (generate) chunks in a radius around a coordinate.
    Generate { coord: ChunkPos, radius: i32 },
    /// Write a block id at a world position.
    PlaceBlock { x: i32, y: i32, z: i32, id: BlockId },
    /// Write air at a world position.
    RemoveBlock { x: i32, y: i32, z: i32 },
}

struct GenerateJob {
    coord: ChunkPos,
    radius: i32,
}

struct GenerateOutput {
    buffer: Vec<u8>,
    radius: i32,
}

struct LightJob {
    coord: ChunkPos,
    center: Vec<u8>,
    neighbors: Vec<((i32, i32), Vec<u8>)>,
}

struct LightOutput {
    buffer: Vec<u8>,
    stats: FloodStats,
}

struct MeshJob {
    coord: ChunkPos,
    center: Vec<u8>,
    neighbors: Vec<((i32, i32), Vec<u8>)>,
}

struct MeshOutput {
    mesh: ChunkMeshData,
}

const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

fn run_light(
    registry: &BlockRegistry,
    queue_capacity: usize,
    job: LightJob,
) -> Result<LightOutput, EngineError> {
    let mut center = ChunkData::from_bytes(job.coord, &job.center)?;
    let mut west = None;
    let mut east = None;
    let mut north = None;
    let mut south = None;
    for ((dx, dz), bytes) in &job.neighbors {
        let chunk = ChunkData::from_bytes(job.coord.offset(*dx, *dz), bytes)?;
        match (*dx, *dz) {
            (-1, 0) => west = Some(chunk),
            (1, 0) => east = Some(chunk),
            (0, -1) => north = Some(chunk),
            (0, 1) => south = Some(chunk),
            other => warn!(offset = ?other, "ignoring non-orthogonal light neighbor"),
        }
    }

    occlude_sky(&mut center, registry);
    let mut neighborhood = ChunkNeighborhood {
        center: &mut center,
        west: west.as_mut(),
        east: east.as_mut(),
        north: north.as_mut(),
        south: south.as_mut(),
    };
    let stats = flood_light(&mut neighborhood, registry, queue_capacity);

    // Neighbor copies are scratch: border cells they received are
    // recomputed when those chunks run their own pass.
    Ok(LightOutput {
        buffer: center.to_bytes(),
        stats,
    })
}

fn run_mesh(registry: &BlockRegistry, job: MeshJob) -> Result<MeshOutput, EngineError> {
    let center = ChunkData::from_bytes(job.coord, &job.center)?;
    let mut west = None;
    let mut east = None;
    let mut north = None;
    let mut south = None;
    for ((dx, dz), bytes) in &job.neighbors {
        let chunk = ChunkData::from_bytes(job.coord.offset(*dx, *dz), bytes)?;
        match (*dx, *dz) {
            (-1, 0) => west = Some(chunk),
            (1, 0) => east = Some(chunk),
            (0, -1) => north = Some(chunk),
            (0, 1) => south = Some(chunk),
            other => warn!(offset = ?other, "ignoring non-orthogonal mesh neighbor"),
        }
    }

    let view = ChunkView {
        center: &center,
        west: west.as_ref(),
        east: east.as_ref(),
        north: north.as_ref(),
        south: south.as_ref(),
    };
    Ok(MeshOutput {
        mesh: mesh_chunk(&view, registry),
    })
}

/// Coordinates the chunk map, worker pools, dirty queue and event bus.
pub struct WorldOrchestrator {
    config: EngineConfig,
    registry: Arc<BlockRegistry>,
    chunks: BTreeMap<ChunkPos, ChunkEntry>,
    dirty: DirtyQueue,
    pending_light: VecDeque<ChunkPos>,
    inflight_terrain: BTreeSet<ChunkPos>,
    inflight_light: BTreeSet<ChunkPos>,
    inflight_mesh: BTreeSet<ChunkPos>,
    terrain_pool: WorkerPool<GenerateJob, GenerateOutput>,
    lighting_pool: WorkerPool<LightJob, LightOutput>,
    meshing_pool: WorkerPool<MeshJob, MeshOutput>,
    bus: EventBus,
    observer_chunk: Option<ChunkPos>,
    last_unload: Instant,
}

impl WorldOrchestrator {
    /// Build the orchestrator and spawn its worker pools. The registry must
    /// be fully populated: pools capture it read-only.
    pub fn new(config: EngineConfig, registry: Arc<BlockRegistry>) -> Self {
        let generator = Arc::new(TerrainGenerator::new(config.seed));
        let terrain_pool = WorkerPool::new(
            "terrain",
            config.terrain_workers,
            |job: &GenerateJob| job.coord,
            {
                let generator = Arc::clone(&generator);
                move |job: GenerateJob| {
                    let chunk = generator.generate_chunk(job.coord);
                    Ok(GenerateOutput {
                        buffer: chunk.to_bytes(),
                        radius: job.radius,
                    })
                }
            },
        );
        let lighting_pool = WorkerPool::new(
            "lighting",
            config.lighting_workers,
            |job: &LightJob| job.coord,
            {
                let registry = Arc::clone(&registry);
                let queue_capacity = config.light_queue_cap;
                move |job: LightJob| run_light(&registry, queue_capacity, job)
            },
        );
        let meshing_pool = WorkerPool::new(
            "meshing",
            config.meshing_workers,
            |job: &MeshJob| job.coord,
            {
                let registry = Arc::clone(&registry);
                move |job: MeshJob| run_mesh(&registry, job)
            },
        );

        let bus = EventBus::new(config.event_capacity);
        Self {
            config,
            registry,
            chunks: BTreeMap::new(),
            dirty: DirtyQueue::default(),
            pending_light: VecDeque::new(),
            inflight_terrain: BTreeSet::new(),
            inflight_light: BTreeSet::new(),
            inflight_mesh: BTreeSet::new(),
            terrain_pool,
            lighting_pool,
            meshing_pool,
            bus,
            observer_chunk: None,
            last_unload: Instant::now(),
        }
    }

    /// The bus collaborators drain for pipeline notifications.
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Number of resident chunks.
    pub fn loaded_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// True while any stage still has queued or in-flight work.
    pub fn is_busy(&self) -> bool {
        !self.inflight_terrain.is_empty()
            || !self.inflight_light.is_empty()
            || !self.inflight_mesh.is_empty()
            || !self.pending_light.is_empty()
            || !self.dirty.is_empty()
    }

    /// Handle one command from a collaborator.
    pub fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Generate { coord, radius } => {
                self.radial_enqueue(coord, radius);
                Ok(())
            }
            Command::PlaceBlock { x, y, z, id } => self.set_block(x, y, z, id),
            Command::RemoveBlock { x, y, z } => self.set_block(x, y, z, BLOCK_AIR),
        }
    }

    /// Track the observer; crossing into a new chunk enqueues the radial
    /// load set around it.
    pub fn update_observer(&mut self, position: Vec3) {
        let chunk = ChunkPos::containing(position.x.floor() as i32, position.z.floor() as i32);
        if self.observer_chunk != Some(chunk) {
            self.observer_chunk = Some(chunk);
            self.radial_enqueue(chunk, self.config.render_radius);
        }
    }

    /// One coordinator tick: apply worker results, dispatch pending work
    /// under the rebuild budget, and sweep unloads.
    pub fn pump(&mut self) {
        self.drain_results();
        self.dispatch_pending_lights();
        self.process_dirty_queue();
        self.maybe_unload();
    }

    /// Write a block at a world position.
    ///
    /// Rejected (with a warning, no events) when `y` is outside the world
    /// or the owning chunk is not resident. A successful edit queues a
    /// re-light of the chunk and, when the edit sits within one voxel of a
    /// vertical face, of the facing neighbor too: light sampling and
    /// ambient occlusion both reach one voxel across the seam.
    pub fn set_block(&mut self, wx: i32, wy: i32, wz: i32, id: BlockId) -> Result<(), EngineError> {
        if wy < 0 || wy >= CHUNK_SIZE_Y as i32 {
            warn!(wx, wy, wz, id, "rejecting block edit outside the world");
            return Err(EngineError::World(WorldError::OutOfBounds {
                x: wx,
                y: wy,
                z: wz,
            }));
        }
        let coord = ChunkPos::containing(wx, wz);
        let Some(entry) = self.chunks.get_mut(&coord) else {
            warn!(wx, wy, wz, %coord, "rejecting block edit into unloaded chunk");
            return Err(EngineError::ChunkNotLoaded(coord));
        };

        let (origin_x, origin_z) = coord.origin();
        let (lx, lz) = (wx - origin_x, wz - origin_z);
        let previous = entry.data.get_block(lx, wy, lz);
        entry.data.set_block(lx, wy, lz, id);

        if id == BLOCK_AIR {
            self.bus.publish(WorldEvent::BlockRemoved {
                pos: [wx, wy, wz],
                id: previous,
                chunk: coord,
            });
        } else {
            self.bus.publish(WorldEvent::BlockPlaced {
                pos: [wx, wy, wz],
                id,
                chunk: coord,
            });
        }

        self.schedule_relight(coord);
        self.dirty.mark(coord, DirtyReason::Block);
        for (dx, dz) in border_neighbor_offsets(lx, lz) {
            let neighbor = coord.offset(dx, dz);
            if self.chunks.contains_key(&neighbor) {
                self.schedule_relight(neighbor);
                self.dirty.mark(neighbor, DirtyReason::Block);
            }
        }
        Ok(())
    }

    fn radial_enqueue(&mut self, center: ChunkPos, radius: i32) {
        for coord in radial_coords(center, radius) {
            self.request_generate(coord, radius);
        }
    }

    fn request_generate(&mut self, coord: ChunkPos, radius: i32) {
        if self.chunks.contains_key(&coord) || self.inflight_terrain.contains(&coord) {
            return;
        }
        self.inflight_terrain.insert(coord);
        self.terrain_pool.submit(GenerateJob { coord, radius });
    }

    fn schedule_relight(&mut self, coord: ChunkPos) {
        if self.chunks.contains_key(&coord) && !self.pending_light.contains(&coord) {
            self.pending_light.push_back(coord);
        }
    }

    fn neighbor_buffers(&self, coord: ChunkPos) -> Vec<((i32, i32), Vec<u8>)> {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|&(dx, dz)| {
                self.chunks
                    .get(&coord.offset(dx, dz))
                    .map(|entry| ((dx, dz), entry.data.to_bytes()))
            })
            .collect()
    }

    fn in_keep_set(&self, coord: ChunkPos) -> bool {
        match self.observer_chunk {
            Some(center) => {
                let keep = self.config.render_radius + 1;
                (coord.x - center.x).abs().max((coord.z - center.z).abs()) <= keep
            }
            None => true,
        }
    }

    fn drain_results(&mut self) {
        while let Some(outcome) = self.terrain_pool.try_recv() {
            self.inflight_terrain.remove(&outcome.coord);
            match outcome.result {
                Ok(output) => self.on_chunk_generated(outcome.coord, output),
                Err(err) => warn!(chunk = %outcome.coord, %err, "terrain task dropped"),
            }
        }
        while let Some(outcome) = self.lighting_pool.try_recv() {
            self.inflight_light.remove(&outcome.coord);
            match outcome.result {
                Ok(output) => self.on_lighting_calculated(outcome.coord, output),
                Err(err) => warn!(chunk = %outcome.coord, %err, "lighting task dropped"),
            }
        }
        while let Some(outcome) = self.meshing_pool.try_recv() {
            self.inflight_mesh.remove(&outcome.coord);
            match outcome.result {
                Ok(output) => self.on_mesh_built(outcome.coord, output),
                Err(err) => warn!(chunk = %outcome.coord, %err, "meshing task dropped"),
            }
        }
    }

    fn on_chunk_generated(&mut self, coord: ChunkPos, output: GenerateOutput) {
        if !self.in_keep_set(coord) {
            debug!(chunk = %coord, "generated chunk already outside keep set");
            return;
        }
        if self.chunks.contains_key(&coord) {
            return;
        }
        let data = match ChunkData::from_bytes(coord, &output.buffer) {
            Ok(data) => data,
            Err(err) => {
                warn!(chunk = %coord, %err, "discarding malformed terrain buffer");
                return;
            }
        };
        self.chunks.insert(coord, ChunkEntry::new(data));
        self.bus.publish(WorldEvent::ChunkGenerated {
            coord,
            radius: output.radius,
        });

        self.schedule_relight(coord);
        // A fresh chunk changes what its neighbors see across the seam;
        // re-queue them even when their first lighting pass is still in
        // flight, so no neighbor settles on a pre-generation snapshot.
        for (dx, dz) in NEIGHBOR_OFFSETS {
            let neighbor = coord.offset(dx, dz);
            if self.chunks.contains_key(&neighbor) {
                self.schedule_relight(neighbor);
            }
        }
    }

    fn on_lighting_calculated(&mut self, coord: ChunkPos, output: LightOutput) {
        let Some(entry) = self.chunks.get_mut(&coord) else {
            debug!(chunk = %coord, "lighting result for unloaded chunk dropped");
            return;
        };
        if let Err(err) = entry.data.replace_words(&output.buffer) {
            warn!(chunk = %coord, %err, "discarding malformed lighting buffer");
            return;
        }
        entry.stages.insert(ChunkStage::LIT);
        let previous_sum = entry.light_sum;
        let new_sum = light_sum(&entry.data);
        entry.light_sum = new_sum;
        if output.stats.dropped > 0 {
            warn!(
                chunk = %coord,
                dropped = output.stats.dropped,
                "light queue overflowed; field may settle on a later pass"
            );
        }
        self.bus.publish(WorldEvent::LightingCalculated {
            coord,
            buffer: Arc::new(output.buffer),
        });

        self.dirty.mark(coord, DirtyReason::Light);
        for (dx, dz) in NEIGHBOR_OFFSETS {
            let neighbor = coord.offset(dx, dz);
            if self.chunks.contains_key(&neighbor) {
                self.dirty.mark(neighbor, DirtyReason::Light);
                // Brighter borders can seed further into the neighbor, so
                // its own flood runs again until the seam stops growing.
                if new_sum > previous_sum {
                    self.schedule_relight(neighbor);
                }
            }
        }
    }

    fn on_mesh_built(&mut self, coord: ChunkPos, output: MeshOutput) {
        let Some(entry) = self.chunks.get_mut(&coord) else {
            debug!(chunk = %coord, "mesh result for unloaded chunk dropped");
            return;
        };
        entry.stages.insert(ChunkStage::MESHED);
        if entry.mesh_hash == Some(output.mesh.hash) {
            debug!(chunk = %coord, "mesh unchanged; skipping rebuild event");
            return;
        }
        entry.mesh_hash = Some(output.mesh.hash);
        self.bus.publish(WorldEvent::ChunkMeshBuilt {
            coord,
            mesh: Arc::new(output.mesh),
        });
    }

    fn dispatch_pending_lights(&mut self) {
        let mut deferred = VecDeque::new();
        while let Some(coord) = self.pending_light.pop_front() {
            let Some(entry) = self.chunks.get(&coord) else {
                continue; // unloaded while waiting
            };
            if self.inflight_light.contains(&coord) {
                deferred.push_back(coord);
                continue;
            }
            let job = LightJob {
                coord,
                center: entry.data.to_bytes(),
                neighbors: self.neighbor_buffers(coord),
            };
            self.inflight_light.insert(coord);
            self.lighting_pool.submit(job);
        }
        self.pending_light = deferred;
    }

    /// Dispatch queued mesh rebuilds in insertion order until the per-frame
    /// budget elapses; the remainder defers to the next pump.
    fn process_dirty_queue(&mut self) {
        let budget = self.config.rebuild_budget();
        let start = Instant::now();
        let mut remaining = self.dirty.len();

        while remaining > 0 && start.elapsed() < budget {
            remaining -= 1;
            let Some((coord, reason)) = self.dirty.pop_front() else {
                break;
            };
            let Some(entry) = self.chunks.get(&coord) else {
                continue; // unloaded entries fall out of the queue
            };
            if !entry.stages.contains(ChunkStage::LIT) || self.inflight_mesh.contains(&coord) {
                self.dirty.requeue_back(coord, reason);
                continue;
            }
            let job = MeshJob {
                coord,
                center: entry.data.to_bytes(),
                neighbors: self.neighbor_buffers(coord),
            };
            self.inflight_mesh.insert(coord);
            self.meshing_pool.submit(job);
        }
    }

    fn maybe_unload(&mut self) {
        if self.last_unload.elapsed() < self.config.unload_interval() {
            return;
        }
        self.last_unload = Instant::now();
        self.unload_sweep();
    }

    fn unload_sweep(&mut self) {
        let Some(center) = self.observer_chunk else {
            return;
        };
        let keep = self.config.render_radius + 1;
        let drop_list: Vec<ChunkPos> = self
            .chunks
            .keys()
            .copied()
            .filter(|pos| (pos.x - center.x).abs().max((pos.z - center.z).abs()) > keep)
            .collect();
        for coord in drop_list {
            self.chunks.remove(&coord);
            self.dirty.remove(coord);
            self.pending_light.retain(|c| *c != coord);
            debug!(chunk = %coord, "unloading chunk outside keep radius");
            self.bus.publish(WorldEvent::ChunkUnloaded { coord });
        }
    }
}

/// Coordinates within `radius` of `center`, nearest first (ties break on
/// (x, z) so the order is deterministic).
fn radial_coords(center: ChunkPos, radius: i32) -> Vec<ChunkPos> {
    let mut coords = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)).max(0) as usize);
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            coords.push(ChunkPos::new(center.x + dx, center.z + dz));
        }
    }
    coords.sort_by_key(|pos| {
        let dx = pos.x - center.x;
        let dz = pos.z - center.z;
        (dx * dx + dz * dz, pos.x, pos.z)
    });
    coords
}

/// Neighbor chunks affected by an edit at a chunk-local column. The band is
/// one voxel wide because border light samples and AO cross the seam.
fn border_neighbor_offsets(lx: i32, lz: i32) -> Vec<(i32, i32)> {
    let mut offsets = Vec::new();
    if lx <= 1 {
        offsets.push((-1, 0));
    }
    if lx >= CHUNK_SIZE_X as i32 - 2 {
        offsets.push((1, 0));
    }
    if lz <= 1 {
        offsets.push((0, -1));
    }
    if lz >= CHUNK_SIZE_Z as i32 - 2 {
        offsets.push((0, 1));
    }
    offsets
}

impl VoxelQuery for WorldOrchestrator {
    fn get_block_id(&self, wx: i32, wy: i32, wz: i32) -> i32 {
        let coord = ChunkPos::containing(wx, wz);
        match self.chunks.get(&coord) {
            Some(entry) => {
                let (ox, oz) = coord.origin();
                i32::from(entry.data.get_block(wx - ox, wy, wz - oz))
            }
            None => AIR_ABSENT,
        }
    }

    fn is_solid(&self, wx: i32, wy: i32, wz: i32) -> bool {
        let id = self.get_block_id(wx, wy, wz);
        if id <= 0 {
            return false;
        }
        self.registry.is_collidable(id as BlockId)
    }

    fn get_light_absorption(&self, wx: i32, wy: i32, wz: i32) -> u8 {
        let id = self.get_block_id(wx, wy, wz);
        if id <= 0 {
            return 0;
        }
        self.registry.absorption(id as BlockId).unwrap_or(15)
    }

    fn get_chunk(&self, coord: ChunkPos) -> Option<&ChunkData> {
        self.chunks.get(&coord).map(|entry| &entry.data)
    }
}

impl LightingQuery for WorldOrchestrator {
    fn get_light(&self, wx: i32, wy: i32, wz: i32) -> LightValue {
        if wy >= CHUNK_SIZE_Y as i32 {
            return LightValue::FULL_SKY;
        }
        if wy < 0 {
            return LightValue::DARK;
        }
        let coord = ChunkPos::containing(wx, wz);
        match self.chunks.get(&coord) {
            Some(entry) => {
                let (ox, oz) = coord.origin();
                LightValue::new(
                    entry.data.get_sky(wx - ox, wy, wz - oz),
                    entry.data.get_block_light(wx - ox, wy, wz - oz),
                )
            }
            None => LightValue::DARK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use voxelforge_assets::builtin_registry;
    use voxelforge_world::{BLOCK_STONE, MAX_LIGHT};

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            render_radius: 1,
            terrain_workers: 1,
            lighting_workers: 1,
            meshing_workers: 1,
            rebuild_budget_ms: 500.0,
            ..EngineConfig::default()
        }
    }

    fn orchestrator() -> WorldOrchestrator {
        WorldOrchestrator::new(quiet_config(), Arc::new(builtin_registry()))
    }

    /// Insert a resident, already-lit chunk without running the pipeline.
    fn insert_lit_chunk(world: &mut WorldOrchestrator, coord: ChunkPos) {
        let mut entry = ChunkEntry::new(ChunkData::new(coord));
        entry.stages.insert(ChunkStage::LIT);
        world.chunks.insert(coord, entry);
    }

    #[test]
    fn dirty_block_reason_is_never_downgraded() {
        let mut queue = DirtyQueue::default();
        let coord = ChunkPos::new(0, 0);
        queue.mark(coord, DirtyReason::Block);
        queue.mark(coord, DirtyReason::Light);
        assert_eq!(queue.reason(coord), Some(DirtyReason::Block));
    }

    #[test]
    fn dirty_non_block_reasons_overwrite() {
        let mut queue = DirtyQueue::default();
        let coord = ChunkPos::new(0, 0);
        queue.mark(coord, DirtyReason::Light);
        queue.mark(coord, DirtyReason::Global);
        assert_eq!(queue.reason(coord), Some(DirtyReason::Global));
        queue.mark(coord, DirtyReason::Block);
        assert_eq!(queue.reason(coord), Some(DirtyReason::Block));
    }

    #[test]
    fn dirty_queue_preserves_insertion_order() {
        let mut queue = DirtyQueue::default();
        queue.mark(ChunkPos::new(2, 0), DirtyReason::Global);
        queue.mark(ChunkPos::new(0, 0), DirtyReason::Light);
        queue.mark(ChunkPos::new(2, 0), DirtyReason::Block); // re-mark keeps slot
        assert_eq!(queue.pop_front().unwrap().0, ChunkPos::new(2, 0));
        assert_eq!(queue.pop_front().unwrap().0, ChunkPos::new(0, 0));
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn radial_coords_sort_nearest_first() {
        let coords = radial_coords(ChunkPos::new(0, 0), 2);
        assert_eq!(coords.len(), 25);
        assert_eq!(coords[0], ChunkPos::new(0, 0));
        let mut last = 0;
        for pos in &coords {
            let d2 = pos.x * pos.x + pos.z * pos.z;
            assert!(d2 >= last, "distance order violated at {pos}");
            last = d2;
        }
    }

    #[test]
    fn border_band_is_one_voxel_wide() {
        assert_eq!(border_neighbor_offsets(10, 10), Vec::<(i32, i32)>::new());
        assert_eq!(border_neighbor_offsets(0, 10), vec![(-1, 0)]);
        assert_eq!(border_neighbor_offsets(1, 10), vec![(-1, 0)]);
        assert_eq!(border_neighbor_offsets(22, 10), vec![(1, 0)]);
        assert_eq!(border_neighbor_offsets(23, 10), vec![(1, 0)]);
        assert_eq!(border_neighbor_offsets(10, 23), vec![(0, 1)]);
        assert_eq!(border_neighbor_offsets(0, 0), vec![(-1, 0), (0, -1)]);
    }

    #[test]
    fn edit_outside_world_is_rejected_without_events() {
        let mut world = orchestrator();
        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        let err = world.set_block(5, 256, 5, BLOCK_STONE).unwrap_err();
        assert!(matches!(
            err,
            EngineError::World(WorldError::OutOfBounds { .. })
        ));
        assert!(world.events().drain().is_empty());
    }

    #[test]
    fn edit_into_unloaded_chunk_is_rejected() {
        let mut world = orchestrator();
        let err = world.set_block(5, 50, 5, BLOCK_STONE).unwrap_err();
        assert!(matches!(err, EngineError::ChunkNotLoaded(_)));
    }

    #[test]
    fn border_edit_schedules_the_neighbor() {
        let mut world = orchestrator();
        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        insert_lit_chunk(&mut world, ChunkPos::new(1, 0));

        world.set_block(22, 50, 10, BLOCK_STONE).unwrap();

        assert!(world.pending_light.contains(&ChunkPos::new(0, 0)));
        assert!(world.pending_light.contains(&ChunkPos::new(1, 0)));
        assert_eq!(
            world.dirty.reason(ChunkPos::new(0, 0)),
            Some(DirtyReason::Block)
        );
        assert_eq!(
            world.dirty.reason(ChunkPos::new(1, 0)),
            Some(DirtyReason::Block)
        );
        let events = world.events().drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "block_placed");
    }

    #[test]
    fn interior_edit_touches_only_its_chunk() {
        let mut world = orchestrator();
        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        insert_lit_chunk(&mut world, ChunkPos::new(1, 0));

        world.set_block(10, 50, 10, BLOCK_STONE).unwrap();
        assert!(world.pending_light.contains(&ChunkPos::new(0, 0)));
        assert!(!world.pending_light.contains(&ChunkPos::new(1, 0)));
    }

    #[test]
    fn removing_a_block_reports_the_previous_id() {
        let mut world = orchestrator();
        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        world.set_block(3, 40, 3, BLOCK_STONE).unwrap();
        world.events().drain();

        world
            .apply(Command::RemoveBlock { x: 3, y: 40, z: 3 })
            .unwrap();
        let events = world.events().drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            WorldEvent::BlockRemoved { id, .. } => assert_eq!(*id, BLOCK_STONE),
            other => panic!("expected BlockRemoved, got {other:?}"),
        }
    }

    #[test]
    fn dirty_dispatch_consumes_the_queue() {
        let mut world = orchestrator();
        for x in 0..4 {
            let coord = ChunkPos::new(x, 0);
            insert_lit_chunk(&mut world, coord);
            world.dirty.mark(coord, DirtyReason::Global);
        }
        assert_eq!(world.dirty.len(), 4);

        world.process_dirty_queue();
        // Generous budget: everything dispatched, residual shrank by the
        // dispatch count.
        assert_eq!(world.dirty.len(), 0);
        assert_eq!(world.inflight_mesh.len(), 4);
    }

    #[test]
    fn zero_budget_dispatches_nothing() {
        let mut config = quiet_config();
        config.rebuild_budget_ms = 0.0;
        let mut world = WorldOrchestrator::new(config, Arc::new(builtin_registry()));
        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        world.dirty.mark(ChunkPos::new(0, 0), DirtyReason::Global);

        world.process_dirty_queue();
        assert_eq!(world.dirty.len(), 1);
        assert!(world.inflight_mesh.is_empty());
    }

    #[test]
    fn unlit_chunks_stay_queued() {
        let mut world = orchestrator();
        let coord = ChunkPos::new(0, 0);
        world.chunks.insert(coord, ChunkEntry::new(ChunkData::new(coord)));
        world.dirty.mark(coord, DirtyReason::Light);

        world.process_dirty_queue();
        assert_eq!(world.dirty.len(), 1, "not lit yet, so not dispatched");
        assert!(world.inflight_mesh.is_empty());
    }

    #[test]
    fn unload_sweep_drops_distant_chunks() {
        let mut world = orchestrator();
        world.observer_chunk = Some(ChunkPos::new(0, 0));
        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        insert_lit_chunk(&mut world, ChunkPos::new(10, 10));
        world.dirty.mark(ChunkPos::new(10, 10), DirtyReason::Global);
        world.pending_light.push_back(ChunkPos::new(10, 10));

        world.unload_sweep();

        assert!(world.chunks.contains_key(&ChunkPos::new(0, 0)));
        assert!(!world.chunks.contains_key(&ChunkPos::new(10, 10)));
        assert!(world.dirty.is_empty());
        assert!(world.pending_light.is_empty());
        let events = world.events().drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "chunk_unloaded");
    }

    #[test]
    fn unload_timer_gates_the_sweep() {
        let mut world = orchestrator();
        world.observer_chunk = Some(ChunkPos::new(0, 0));
        insert_lit_chunk(&mut world, ChunkPos::new(10, 10));

        // Fresh timer: nothing happens.
        world.maybe_unload();
        assert!(world.chunks.contains_key(&ChunkPos::new(10, 10)));

        // Expired timer: the sweep runs.
        world.last_unload = Instant::now() - Duration::from_secs(60);
        world.maybe_unload();
        assert!(!world.chunks.contains_key(&ChunkPos::new(10, 10)));
    }

    #[test]
    fn voxel_query_defaults() {
        let mut world = orchestrator();
        assert_eq!(world.get_block_id(0, 50, 0), AIR_ABSENT);
        assert!(!world.is_solid(0, 50, 0));
        assert_eq!(world.get_light_absorption(0, 50, 0), 0);

        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        world.set_block(4, 50, 4, BLOCK_STONE).unwrap();
        assert_eq!(world.get_block_id(4, 50, 4), i32::from(BLOCK_STONE));
        assert!(world.is_solid(4, 50, 4));
        assert_eq!(world.get_light_absorption(4, 50, 4), 15);
        assert_eq!(world.get_block_id(4, 300, 4), i32::from(BLOCK_AIR));
    }

    #[test]
    fn lighting_query_defaults() {
        let mut world = orchestrator();
        assert_eq!(world.get_light(0, 50, 0), LightValue::DARK);
        assert_eq!(world.get_light(0, 300, 0).sky, [MAX_LIGHT; 3]);
        assert_eq!(world.get_light(0, -5, 0), LightValue::DARK);

        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        world
            .chunks
            .get_mut(&ChunkPos::new(0, 0))
            .unwrap()
            .data
            .set_block_light(2, 60, 2, 9, 3, 1);
        assert_eq!(world.get_light(2, 60, 2).block, [9, 3, 1]);
    }

    #[test]
    fn relight_is_deduplicated_per_coord() {
        let mut world = orchestrator();
        insert_lit_chunk(&mut world, ChunkPos::new(0, 0));
        world.schedule_relight(ChunkPos::new(0, 0));
        world.schedule_relight(ChunkPos::new(0, 0));
        assert_eq!(world.pending_light.len(), 1);
    }
}
