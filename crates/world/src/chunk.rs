use std::collections::HashMap;
use std::fmt;

use crate::WorldError;

/// Chunk width (X axis) in voxels.
pub const CHUNK_SIZE_X: usize = 24;
/// Chunk height (Y axis) in voxels.
pub const CHUNK_SIZE_Y: usize = 256;
/// Chunk depth (Z axis) in voxels.
pub const CHUNK_SIZE_Z: usize = 24;
/// Total voxel count per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;
/// Serialized chunk size in bytes (one little-endian u32 word per voxel).
pub const CHUNK_BYTE_LEN: usize = CHUNK_VOLUME * 4;

/// Maximum light level per channel (0-15 range).
pub const MAX_LIGHT: u8 = 15;

/// Block identifier referencing the registry.
pub type BlockId = u16;

/// Reserved ID for air.
pub const BLOCK_AIR: BlockId = 0;

/// ID for stone.
pub const BLOCK_STONE: BlockId = 1;

/// ID for dirt.
pub const BLOCK_DIRT: BlockId = 2;

/// ID for grass.
pub const BLOCK_GRASS: BlockId = 3;

/// ID for sand.
pub const BLOCK_SAND: BlockId = 4;

/// ID for bedrock.
pub const BLOCK_BEDROCK: BlockId = 5;

/// ID for water source block.
pub const BLOCK_WATER: BlockId = 6;

/// ID for tree log.
pub const BLOCK_LOG: BlockId = 7;

/// ID for leaves.
pub const BLOCK_LEAVES: BlockId = 8;

/// ID for glass.
pub const BLOCK_GLASS: BlockId = 9;

/// ID for glowstone.
pub const BLOCK_GLOWSTONE: BlockId = 10;

/// ID for loose surface rock.
pub const BLOCK_ROCK: BlockId = 11;

/// ID for snow cover.
pub const BLOCK_SNOW: BlockId = 12;

// Packed voxel word layout:
//   bits  0-15  block id
//   bits 16-19  sky light
//   bits 20-23  red block light
//   bits 24-27  green block light
//   bits 28-31  blue block light
const BLOCK_MASK: u32 = 0x0000_FFFF;
const SKY_SHIFT: u32 = 16;
const RED_SHIFT: u32 = 20;
const GREEN_SHIFT: u32 = 24;
const BLUE_SHIFT: u32 = 28;
const NIBBLE: u32 = 0xF;

/// Chunk-local position (X, Y, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl LocalPos {
    /// Convert to a linear index within the packed word array.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE_X);
        debug_assert!(self.y < CHUNK_SIZE_Y);
        debug_assert!(self.z < CHUNK_SIZE_Z);
        (self.y * CHUNK_SIZE_Z + self.z) * CHUNK_SIZE_X + self.x
    }
}

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World-space coordinates of the chunk's (0, 0) column.
    pub const fn origin(self) -> (i32, i32) {
        (self.x * CHUNK_SIZE_X as i32, self.z * CHUNK_SIZE_Z as i32)
    }

    /// Neighbor chunk coordinate offset by whole chunks.
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Chunk containing the given world-space column.
    pub fn containing(world_x: i32, world_z: i32) -> Self {
        Self {
            x: world_x.div_euclid(CHUNK_SIZE_X as i32),
            z: world_z.div_euclid(CHUNK_SIZE_Z as i32),
        }
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Unified voxel + light store for one chunk.
///
/// One packed u32 word per voxel, indexed `x + z*SX + y*SX*SZ` so a vertical
/// scan walks the array with a constant stride. Light setters clamp their
/// channels to [`MAX_LIGHT`]; all accessors tolerate out-of-range coordinates
/// (reads return air / zero light, writes no-op) so callers on the data plane
/// never fault.
#[derive(Clone)]
pub struct ChunkData {
    position: ChunkPos,
    words: Box<[u32]>,
    /// Sparse per-voxel metadata for complex blocks, keyed by linear index.
    /// Travels out-of-band of the packed wire buffer.
    metadata: HashMap<usize, serde_json::Value>,
}

impl ChunkData {
    /// Allocate a fresh chunk filled with air and zero light.
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            words: vec![0u32; CHUNK_VOLUME].into_boxed_slice(),
            metadata: HashMap::new(),
        }
    }

    /// Reconstruct a chunk from its serialized wire buffer.
    ///
    /// The buffer must be exactly [`CHUNK_BYTE_LEN`] bytes of little-endian
    /// u32 words in linear index order.
    pub fn from_bytes(position: ChunkPos, bytes: &[u8]) -> Result<Self, WorldError> {
        if bytes.len() != CHUNK_BYTE_LEN {
            return Err(WorldError::InvalidBufferLength {
                expected: CHUNK_BYTE_LEN,
                found: bytes.len(),
            });
        }
        let mut words = vec![0u32; CHUNK_VOLUME].into_boxed_slice();
        for (word, raw) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
        Ok(Self {
            position,
            words,
            metadata: HashMap::new(),
        })
    }

    /// Replace the packed words from a wire buffer, keeping position and
    /// metadata. Used when a worker hands back an updated copy.
    pub fn replace_words(&mut self, bytes: &[u8]) -> Result<(), WorldError> {
        if bytes.len() != CHUNK_BYTE_LEN {
            return Err(WorldError::InvalidBufferLength {
                expected: CHUNK_BYTE_LEN,
                found: bytes.len(),
            });
        }
        for (word, raw) in self.words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }
        Ok(())
    }

    /// Serialize the packed words to the little-endian wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CHUNK_BYTE_LEN);
        for word in self.words.iter() {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    #[inline]
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    /// Borrow the raw packed words (for hashing / transfer).
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    #[inline]
    fn index(x: i32, y: i32, z: i32) -> Option<usize> {
        if x < 0
            || y < 0
            || z < 0
            || x >= CHUNK_SIZE_X as i32
            || y >= CHUNK_SIZE_Y as i32
            || z >= CHUNK_SIZE_Z as i32
        {
            return None;
        }
        Some(
            LocalPos {
                x: x as usize,
                y: y as usize,
                z: z as usize,
            }
            .index(),
        )
    }

    /// Fetch the block id, or air when out of range.
    #[inline]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        match Self::index(x, y, z) {
            Some(idx) => (self.words[idx] & BLOCK_MASK) as BlockId,
            None => BLOCK_AIR,
        }
    }

    /// Store a block id, preserving the light bits. Out-of-range writes no-op.
    /// Changing the id drops any metadata attached to the voxel.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        if let Some(idx) = Self::index(x, y, z) {
            let word = self.words[idx];
            if (word & BLOCK_MASK) as BlockId != id {
                self.metadata.remove(&idx);
            }
            self.words[idx] = (word & !BLOCK_MASK) | u32::from(id);
        }
    }

    /// Fetch the sky light nibble.
    ///
    /// Above the world (y >= 256) this reads as full sky; everywhere else
    /// out of range it reads as zero.
    #[inline]
    pub fn get_sky(&self, x: i32, y: i32, z: i32) -> u8 {
        if y >= CHUNK_SIZE_Y as i32 {
            return MAX_LIGHT;
        }
        match Self::index(x, y, z) {
            Some(idx) => ((self.words[idx] >> SKY_SHIFT) & NIBBLE) as u8,
            None => 0,
        }
    }

    /// Store the sky light nibble, clamped to [`MAX_LIGHT`].
    pub fn set_sky(&mut self, x: i32, y: i32, z: i32, value: u8) {
        if let Some(idx) = Self::index(x, y, z) {
            let v = u32::from(value.min(MAX_LIGHT));
            self.words[idx] = (self.words[idx] & !(NIBBLE << SKY_SHIFT)) | (v << SKY_SHIFT);
        }
    }

    /// Fetch the colored block light as (r, g, b).
    #[inline]
    pub fn get_block_light(&self, x: i32, y: i32, z: i32) -> [u8; 3] {
        match Self::index(x, y, z) {
            Some(idx) => {
                let word = self.words[idx];
                [
                    ((word >> RED_SHIFT) & NIBBLE) as u8,
                    ((word >> GREEN_SHIFT) & NIBBLE) as u8,
                    ((word >> BLUE_SHIFT) & NIBBLE) as u8,
                ]
            }
            None => [0, 0, 0],
        }
    }

    /// Store the colored block light, each channel clamped to [`MAX_LIGHT`].
    pub fn set_block_light(&mut self, x: i32, y: i32, z: i32, r: u8, g: u8, b: u8) {
        if let Some(idx) = Self::index(x, y, z) {
            let mask = (NIBBLE << RED_SHIFT) | (NIBBLE << GREEN_SHIFT) | (NIBBLE << BLUE_SHIFT);
            let packed = (u32::from(r.min(MAX_LIGHT)) << RED_SHIFT)
                | (u32::from(g.min(MAX_LIGHT)) << GREEN_SHIFT)
                | (u32::from(b.min(MAX_LIGHT)) << BLUE_SHIFT);
            self.words[idx] = (self.words[idx] & !mask) | packed;
        }
    }

    /// Attach metadata to a voxel. Out-of-range positions are ignored.
    pub fn set_metadata(&mut self, x: i32, y: i32, z: i32, value: serde_json::Value) {
        if let Some(idx) = Self::index(x, y, z) {
            self.metadata.insert(idx, value);
        }
    }

    /// Fetch metadata attached to a voxel, if any.
    pub fn metadata(&self, x: i32, y: i32, z: i32) -> Option<&serde_json::Value> {
        Self::index(x, y, z).and_then(|idx| self.metadata.get(&idx))
    }

    /// Y of the topmost non-air voxel in a column, if any.
    pub fn highest_solid(&self, x: i32, z: i32) -> Option<i32> {
        (0..CHUNK_SIZE_Y as i32)
            .rev()
            .find(|&y| self.get_block(x, y, z) != BLOCK_AIR)
    }

    /// Number of non-air voxels (used by the headless summary).
    pub fn solid_count(&self) -> usize {
        self.words
            .iter()
            .filter(|word| (*word & BLOCK_MASK) != u32::from(BLOCK_AIR))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_round_trip_preserves_unrelated_channels() {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        chunk.set_block(3, 100, 7, 0xBEEF);
        chunk.set_sky(3, 100, 7, 11);
        chunk.set_block_light(3, 100, 7, 1, 2, 3);

        assert_eq!(chunk.get_block(3, 100, 7), 0xBEEF);
        assert_eq!(chunk.get_sky(3, 100, 7), 11);
        assert_eq!(chunk.get_block_light(3, 100, 7), [1, 2, 3]);

        // Rewriting one field leaves the others untouched.
        chunk.set_sky(3, 100, 7, 4);
        assert_eq!(chunk.get_block(3, 100, 7), 0xBEEF);
        assert_eq!(chunk.get_block_light(3, 100, 7), [1, 2, 3]);
        assert_eq!(chunk.get_sky(3, 100, 7), 4);
    }

    #[test]
    fn light_setters_clamp_to_max() {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        chunk.set_sky(0, 0, 0, 99);
        chunk.set_block_light(0, 0, 0, 200, 16, 15);
        assert_eq!(chunk.get_sky(0, 0, 0), MAX_LIGHT);
        assert_eq!(chunk.get_block_light(0, 0, 0), [15, 15, 15]);
    }

    #[test]
    fn out_of_range_reads_return_defaults() {
        let chunk = ChunkData::new(ChunkPos::new(0, 0));
        assert_eq!(chunk.get_block(-1, 0, 0), BLOCK_AIR);
        assert_eq!(chunk.get_block(0, 256, 0), BLOCK_AIR);
        assert_eq!(chunk.get_sky(0, 256, 0), MAX_LIGHT);
        assert_eq!(chunk.get_sky(0, -1, 0), 0);
        assert_eq!(chunk.get_block_light(24, 0, 0), [0, 0, 0]);
    }

    #[test]
    fn out_of_range_writes_no_op() {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        chunk.set_block(-1, 0, 0, BLOCK_STONE);
        chunk.set_block(0, 300, 0, BLOCK_STONE);
        chunk.set_sky(24, 0, 0, 15);
        assert_eq!(chunk.solid_count(), 0);
    }

    #[test]
    fn wire_round_trip_is_byte_identical() {
        let mut chunk = ChunkData::new(ChunkPos::new(2, -3));
        chunk.set_block(0, 0, 0, BLOCK_BEDROCK);
        chunk.set_block(5, 64, 5, BLOCK_GLOWSTONE);
        chunk.set_block_light(5, 64, 5, 15, 12, 8);
        chunk.set_sky(23, 255, 23, 15);

        let bytes = chunk.to_bytes();
        assert_eq!(bytes.len(), CHUNK_BYTE_LEN);
        let restored = ChunkData::from_bytes(chunk.position(), &bytes).unwrap();
        assert_eq!(restored.words(), chunk.words());
        assert_eq!(restored.get_block_light(5, 64, 5), [15, 12, 8]);
    }

    #[test]
    fn from_bytes_rejects_bad_length() {
        let err = ChunkData::from_bytes(ChunkPos::new(0, 0), &[0u8; 16]).unwrap_err();
        assert!(matches!(err, WorldError::InvalidBufferLength { .. }));
    }

    #[test]
    fn metadata_follows_block_identity() {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        chunk.set_block(1, 2, 3, BLOCK_GLOWSTONE);
        chunk.set_metadata(1, 2, 3, serde_json::json!({ "pulse": 3 }));
        assert!(chunk.metadata(1, 2, 3).is_some());

        // Same id keeps metadata, a different id drops it.
        chunk.set_block(1, 2, 3, BLOCK_GLOWSTONE);
        assert!(chunk.metadata(1, 2, 3).is_some());
        chunk.set_block(1, 2, 3, BLOCK_STONE);
        assert!(chunk.metadata(1, 2, 3).is_none());
    }

    #[test]
    fn containing_maps_negative_world_coords() {
        assert_eq!(ChunkPos::containing(0, 0), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::containing(23, 23), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::containing(24, 0), ChunkPos::new(1, 0));
        assert_eq!(ChunkPos::containing(-1, -24), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::containing(-25, 47), ChunkPos::new(-2, 1));
    }

    #[test]
    fn linear_index_matches_layout() {
        // x + z*SX + y*SX*SZ
        assert_eq!(LocalPos { x: 0, y: 0, z: 0 }.index(), 0);
        assert_eq!(LocalPos { x: 5, y: 0, z: 0 }.index(), 5);
        assert_eq!(LocalPos { x: 0, y: 0, z: 1 }.index(), CHUNK_SIZE_X);
        assert_eq!(
            LocalPos { x: 0, y: 1, z: 0 }.index(),
            CHUNK_SIZE_X * CHUNK_SIZE_Z
        );
    }
}
