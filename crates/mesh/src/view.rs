//! Read-only five-chunk window the mesher samples from.

use voxelforge_world::{
    BlockId, ChunkData, LightValue, BLOCK_AIR, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z,
};

/// The chunk being meshed plus its four orthogonal neighbors.
///
/// Coordinates are center-local; X and Z may run one chunk past the borders
/// in every direction. Reads above the world see air under full sky, reads
/// below see air in darkness, and reads into an unloaded neighbor see dark
/// air (the seam is rebuilt when that neighbor arrives).
pub struct ChunkView<'a> {
    pub center: &'a ChunkData,
    pub west: Option<&'a ChunkData>,
    pub east: Option<&'a ChunkData>,
    pub north: Option<&'a ChunkData>,
    pub south: Option<&'a ChunkData>,
}

impl<'a> ChunkView<'a> {
    /// A view with no neighbors loaded.
    pub fn isolated(center: &'a ChunkData) -> Self {
        Self {
            center,
            west: None,
            east: None,
            north: None,
            south: None,
        }
    }

    fn resolve(&self, x: i32, z: i32) -> Option<(&'a ChunkData, i32, i32)> {
        let sx = CHUNK_SIZE_X as i32;
        let sz = CHUNK_SIZE_Z as i32;
        let x_in = (0..sx).contains(&x);
        let z_in = (0..sz).contains(&z);
        match (x_in, z_in) {
            (true, true) => Some((self.center, x, z)),
            (false, true) if x < 0 => self.west.map(|c| (c, x + sx, z)),
            (false, true) => self.east.map(|c| (c, x - sx, z)),
            (true, false) if z < 0 => self.north.map(|c| (c, x, z + sz)),
            (true, false) => self.south.map(|c| (c, x, z - sz)),
            (false, false) => None,
        }
    }

    /// Block id at a view coordinate.
    pub fn block(&self, x: i32, y: i32, z: i32) -> BlockId {
        if y < 0 || y >= CHUNK_SIZE_Y as i32 {
            return BLOCK_AIR;
        }
        match self.resolve(x, z) {
            Some((chunk, lx, lz)) => chunk.get_block(lx, y, lz),
            None => BLOCK_AIR,
        }
    }

    /// Light at a view coordinate, with the world-boundary conventions.
    pub fn light(&self, x: i32, y: i32, z: i32) -> LightValue {
        if y >= CHUNK_SIZE_Y as i32 {
            return LightValue::FULL_SKY;
        }
        if y < 0 {
            return LightValue::DARK;
        }
        match self.resolve(x, z) {
            Some((chunk, lx, lz)) => LightValue::new(
                chunk.get_sky(lx, y, lz),
                chunk.get_block_light(lx, y, lz),
            ),
            None => LightValue::DARK,
        }
    }
}
