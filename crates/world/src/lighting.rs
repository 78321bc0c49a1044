//! Two-pass chunk illumination.
//!
//! Pass A ([`occlude_sky`]) is a self-contained top-down scan: each column
//! starts at full sky brightness and loses each block's absorption on the
//! way down. Pass B ([`flood_light`]) is a colored BFS flood over the chunk
//! and its four orthogonal neighbors: it seeds from neighbor border columns,
//! from every stored light value, and from emissive blocks, then relaxes
//! cells toward the max-over-paths fixpoint. Queue order never changes the
//! resulting field, only the time to reach it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chunk::{
    BlockId, ChunkData, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, MAX_LIGHT,
};

/// Default flood queue capacity, sized for the worst-case sky flood of a
/// single chunk (~147K cells times six expansions).
pub const DEFAULT_LIGHT_QUEUE_CAP: usize = 2 * 1024 * 1024;

/// Per-block light interaction used by both passes.
///
/// Implementors decide how unknown ids behave; the registry adapter treats
/// them as fully absorbing and logs once.
pub trait BlockLightProfile {
    /// Propagation cost of the block, 0 (air) to 15 (opaque).
    fn absorption(&self, id: BlockId) -> u8;
    /// Emissive contribution seeded into the flood pass.
    fn emission(&self, id: BlockId) -> [u8; 3];
}

/// Sky and colored block light of one voxel, surfaced at the API boundary.
/// Sky light is stored as a single intensity and widened to grey RGB here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightValue {
    pub sky: [u8; 3],
    pub block: [u8; 3],
}

impl LightValue {
    /// Complete darkness (unloaded chunks, below the world).
    pub const DARK: LightValue = LightValue {
        sky: [0, 0, 0],
        block: [0, 0, 0],
    };

    /// Full overhead sky with no block light (above the world).
    pub const FULL_SKY: LightValue = LightValue {
        sky: [MAX_LIGHT; 3],
        block: [0, 0, 0],
    };

    pub fn new(sky: u8, block: [u8; 3]) -> Self {
        Self {
            sky: [sky; 3],
            block,
        }
    }

    /// Component-wise max of the sky and block channels.
    pub fn combined(&self) -> [u8; 3] {
        [
            self.sky[0].max(self.block[0]),
            self.sky[1].max(self.block[1]),
            self.sky[2].max(self.block[2]),
        ]
    }
}

/// Pass A: top-down sky occlusion.
///
/// Block-light bits are left untouched.
pub fn occlude_sky(chunk: &mut ChunkData, profile: &dyn BlockLightProfile) {
    for z in 0..CHUNK_SIZE_Z as i32 {
        for x in 0..CHUNK_SIZE_X as i32 {
            let mut sky = MAX_LIGHT;
            for y in (0..CHUNK_SIZE_Y as i32).rev() {
                let absorption = profile.absorption(chunk.get_block(x, y, z));
                sky = sky.saturating_sub(absorption);
                chunk.set_sky(x, y, z, sky);
            }
        }
    }
}

/// One queued brightness emission: a cell position (neighbor-relative
/// coordinates allowed on X and Z) and the four light channels (r, g, b, sky).
#[derive(Debug, Clone, Copy, Default)]
struct LightNode {
    x: i16,
    y: i16,
    z: i16,
    light: [u8; 4],
}

/// Fixed-capacity ring buffer for flood nodes. Overflow drops the incoming
/// node and counts it; the pass continues with what fit.
struct LightQueue {
    buf: Vec<LightNode>,
    head: usize,
    len: usize,
    capacity: usize,
    dropped: usize,
}

impl LightQueue {
    fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            head: 0,
            len: 0,
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    fn push(&mut self, node: LightNode) -> bool {
        if self.len == self.capacity {
            self.dropped += 1;
            return false;
        }
        let tail = (self.head + self.len) % self.capacity;
        if tail == self.buf.len() {
            self.buf.push(node);
        } else {
            self.buf[tail] = node;
        }
        self.len += 1;
        true
    }

    fn pop(&mut self) -> Option<LightNode> {
        if self.len == 0 {
            return None;
        }
        let node = self.buf[self.head];
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        Some(node)
    }
}

/// Which chunk of the neighborhood owns a neighbor-relative coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Center,
    West,
    East,
    North,
    South,
}

/// The flood domain: the chunk being lit plus its four orthogonal
/// neighbors. Neighbor coordinates extend the center's local space
/// (x < 0 is west, x >= 24 east, z < 0 north, z >= 24 south); diagonal
/// space is unowned and reads as missing.
pub struct ChunkNeighborhood<'a> {
    pub center: &'a mut ChunkData,
    pub west: Option<&'a mut ChunkData>,
    pub east: Option<&'a mut ChunkData>,
    pub north: Option<&'a mut ChunkData>,
    pub south: Option<&'a mut ChunkData>,
}

impl<'a> ChunkNeighborhood<'a> {
    /// A neighborhood with no neighbors loaded.
    pub fn isolated(center: &'a mut ChunkData) -> Self {
        Self {
            center,
            west: None,
            east: None,
            north: None,
            south: None,
        }
    }

    fn resolve(x: i16, z: i16) -> Option<(Slot, i32, i32)> {
        let sx = CHUNK_SIZE_X as i16;
        let sz = CHUNK_SIZE_Z as i16;
        let x_in = (0..sx).contains(&x);
        let z_in = (0..sz).contains(&z);
        match (x_in, z_in) {
            (true, true) => Some((Slot::Center, i32::from(x), i32::from(z))),
            (false, true) if x < 0 => Some((Slot::West, i32::from(x + sx), i32::from(z))),
            (false, true) => Some((Slot::East, i32::from(x - sx), i32::from(z))),
            (true, false) if z < 0 => Some((Slot::North, i32::from(x), i32::from(z + sz))),
            (true, false) => Some((Slot::South, i32::from(x), i32::from(z - sz))),
            (false, false) => None, // diagonal space is not part of the domain
        }
    }

    fn chunk(&self, slot: Slot) -> Option<&ChunkData> {
        match slot {
            Slot::Center => Some(self.center),
            Slot::West => self.west.as_deref(),
            Slot::East => self.east.as_deref(),
            Slot::North => self.north.as_deref(),
            Slot::South => self.south.as_deref(),
        }
    }

    fn chunk_mut(&mut self, slot: Slot) -> Option<&mut ChunkData> {
        match slot {
            Slot::Center => Some(self.center),
            Slot::West => self.west.as_deref_mut(),
            Slot::East => self.east.as_deref_mut(),
            Slot::North => self.north.as_deref_mut(),
            Slot::South => self.south.as_deref_mut(),
        }
    }

    /// Block id at a neighbor-relative coordinate; None when the owning
    /// chunk is not loaded.
    fn block_at(&self, x: i16, y: i16, z: i16) -> Option<BlockId> {
        let (slot, lx, lz) = Self::resolve(x, z)?;
        let chunk = self.chunk(slot)?;
        Some(chunk.get_block(lx, i32::from(y), lz))
    }

    fn light_at(&self, x: i16, y: i16, z: i16) -> Option<[u8; 4]> {
        let (slot, lx, lz) = Self::resolve(x, z)?;
        let chunk = self.chunk(slot)?;
        let [r, g, b] = chunk.get_block_light(lx, i32::from(y), lz);
        Some([r, g, b, chunk.get_sky(lx, i32::from(y), lz)])
    }

    fn set_light_at(&mut self, x: i16, y: i16, z: i16, light: [u8; 4]) {
        if let Some((slot, lx, lz)) = Self::resolve(x, z) {
            if let Some(chunk) = self.chunk_mut(slot) {
                chunk.set_block_light(lx, i32::from(y), lz, light[0], light[1], light[2]);
                chunk.set_sky(lx, i32::from(y), lz, light[3]);
            }
        }
    }
}

/// Counters reported by the flood pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloodStats {
    /// Nodes popped and expanded (or skipped by the visited map).
    pub processed: usize,
    /// Cells whose stored light was raised.
    pub raised: usize,
    /// Nodes lost to queue overflow.
    pub dropped: usize,
}

const DIRECTIONS: [(i16, i16, i16); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

fn pack_pos(x: i16, y: i16, z: i16) -> u32 {
    // x and z are neighbor-relative in [-24, 48); bias into 7 bits each.
    let bx = (x + CHUNK_SIZE_X as i16) as u32;
    let bz = (z + CHUNK_SIZE_Z as i16) as u32;
    bx | (bz << 7) | ((y as u32) << 14)
}

fn dominates_any(candidate: [u8; 4], seen: [u8; 4]) -> bool {
    candidate.iter().zip(seen.iter()).any(|(c, s)| c > s)
}

fn component_max(a: [u8; 4], b: [u8; 4]) -> [u8; 4] {
    [
        a[0].max(b[0]),
        a[1].max(b[1]),
        a[2].max(b[2]),
        a[3].max(b[3]),
    ]
}

/// Pass B: colored BFS flood with neighbor and emissive seeding.
///
/// Directions whose chunk is not loaded are silently skipped; the seam is
/// healed when that neighbor runs its own lighting pass later.
pub fn flood_light(
    neighborhood: &mut ChunkNeighborhood<'_>,
    profile: &dyn BlockLightProfile,
    queue_capacity: usize,
) -> FloodStats {
    let mut queue = LightQueue::new(queue_capacity);
    let mut stats = FloodStats::default();

    seed_borders(neighborhood, &mut queue);
    seed_interior(neighborhood, profile, &mut queue);

    // Max light seen per cell; a node only re-expands a cell when it
    // strictly dominates the stored max on at least one channel.
    let mut seen: HashMap<u32, [u8; 4]> = HashMap::new();

    while let Some(node) = queue.pop() {
        stats.processed += 1;

        let key = pack_pos(node.x, node.y, node.z);
        match seen.get_mut(&key) {
            Some(max_seen) => {
                if !dominates_any(node.light, *max_seen) {
                    continue;
                }
                *max_seen = component_max(node.light, *max_seen);
            }
            None => {
                seen.insert(key, node.light);
            }
        }

        for (dx, dy, dz) in DIRECTIONS {
            let (nx, ny, nz) = (node.x + dx, node.y + dy, node.z + dz);
            if ny < 0 || ny >= CHUNK_SIZE_Y as i16 {
                continue;
            }
            let Some(id) = neighborhood.block_at(nx, ny, nz) else {
                continue; // chunk not loaded in that direction
            };
            let absorption = profile.absorption(id);
            if absorption >= MAX_LIGHT {
                continue;
            }

            let step = 1 + absorption;
            let candidate = [
                node.light[0].saturating_sub(step),
                node.light[1].saturating_sub(step),
                node.light[2].saturating_sub(step),
                node.light[3].saturating_sub(step),
            ];
            if candidate == [0, 0, 0, 0] {
                continue;
            }

            let Some(current) = neighborhood.light_at(nx, ny, nz) else {
                continue;
            };
            if !dominates_any(candidate, current) {
                continue;
            }
            let updated = component_max(candidate, current);
            neighborhood.set_light_at(nx, ny, nz, updated);
            stats.raised += 1;
            queue.push(LightNode {
                x: nx,
                y: ny,
                z: nz,
                light: updated,
            });
        }
    }

    stats.dropped = queue.dropped;
    stats
}

/// Seed the border columns of each loaded neighbor, expressed in
/// neighbor-relative coordinates.
fn seed_borders(neighborhood: &mut ChunkNeighborhood<'_>, queue: &mut LightQueue) {
    let sx = CHUNK_SIZE_X as i16;
    let sz = CHUNK_SIZE_Z as i16;

    for y in 0..CHUNK_SIZE_Y as i16 {
        for z in 0..sz {
            // West neighbor's eastern face sits at x = -1.
            seed_cell(neighborhood, queue, -1, y, z);
            // East neighbor's western face sits at x = 24.
            seed_cell(neighborhood, queue, sx, y, z);
        }
        for x in 0..sx {
            seed_cell(neighborhood, queue, x, y, -1);
            seed_cell(neighborhood, queue, x, y, sz);
        }
    }
}

fn seed_cell(neighborhood: &ChunkNeighborhood<'_>, queue: &mut LightQueue, x: i16, y: i16, z: i16) {
    if let Some(light) = neighborhood.light_at(x, y, z) {
        if light != [0, 0, 0, 0] {
            queue.push(LightNode { x, y, z, light });
        }
    }
}

/// Seed every lit interior cell, merging emissive block contributions into
/// storage first.
fn seed_interior(
    neighborhood: &mut ChunkNeighborhood<'_>,
    profile: &dyn BlockLightProfile,
    queue: &mut LightQueue,
) {
    for y in 0..CHUNK_SIZE_Y as i32 {
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                let chunk = &mut *neighborhood.center;
                let id = chunk.get_block(x, y, z);
                let [mut r, mut g, mut b] = chunk.get_block_light(x, y, z);
                let sky = chunk.get_sky(x, y, z);

                let emission = profile.emission(id);
                if emission != [0, 0, 0] {
                    r = r.max(emission[0]);
                    g = g.max(emission[1]);
                    b = b.max(emission[2]);
                    chunk.set_block_light(x, y, z, r, g, b);
                }

                if r > 0 || g > 0 || b > 0 || sky > 0 {
                    queue.push(LightNode {
                        x: x as i16,
                        y: y as i16,
                        z: z as i16,
                        light: [r, g, b, sky],
                    });
                }
            }
        }
    }
}
