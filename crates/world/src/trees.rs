//! Tree decoration for populated chunks.
//!
//! Trees are a trunk column of logs topped by a taxicab-radius leaf
//! cluster. Leaves never overwrite existing non-air blocks, and nothing is
//! written outside the chunk box.

use rand::rngs::StdRng;
use rand::Rng;

use crate::chunk::{
    ChunkData, BLOCK_AIR, BLOCK_DIRT, BLOCK_GRASS, BLOCK_LEAVES, BLOCK_LOG, BLOCK_SNOW,
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z,
};

/// Taxicab radius of the leaf cluster around the trunk top.
const LEAF_RADIUS: i32 = 2;

/// A tree rooted at a chunk-local column.
#[derive(Debug, Clone, Copy)]
pub struct Tree {
    pub local_x: i32,
    /// First trunk block (one above the surface).
    pub base_y: i32,
    pub local_z: i32,
    pub trunk_height: i32,
}

impl Tree {
    /// Write the tree into the chunk. Writes falling outside the chunk box
    /// or above the world ceiling are skipped.
    pub fn generate_into_chunk(&self, chunk: &mut ChunkData) {
        let top = self.base_y + self.trunk_height - 1;
        if top >= CHUNK_SIZE_Y as i32 {
            return;
        }

        for y in self.base_y..=top {
            chunk.set_block(self.local_x, y, self.local_z, BLOCK_LOG);
        }

        // Leaf cluster centered one block above the trunk top.
        let center_y = top + 1;
        for dy in -LEAF_RADIUS..=LEAF_RADIUS {
            for dz in -LEAF_RADIUS..=LEAF_RADIUS {
                for dx in -LEAF_RADIUS..=LEAF_RADIUS {
                    if dx.abs() + dy.abs() + dz.abs() > LEAF_RADIUS {
                        continue;
                    }
                    let (x, y, z) = (self.local_x + dx, center_y + dy, self.local_z + dz);
                    if chunk.get_block(x, y, z) == BLOCK_AIR {
                        chunk.set_block(x, y, z, BLOCK_LEAVES);
                    }
                }
            }
        }
    }
}

/// Attempt tree placements from the chunk-seeded decorator RNG stream.
pub fn populate_trees(chunk: &mut ChunkData, rng: &mut StdRng, attempts: u32) {
    for _ in 0..attempts {
        let local_x = rng.gen_range(0..CHUNK_SIZE_X as i32);
        let local_z = rng.gen_range(0..CHUNK_SIZE_Z as i32);
        let trunk_height = rng.gen_range(4..=6);

        let Some(surface_y) = chunk.highest_solid(local_x, local_z) else {
            continue;
        };
        let ground = chunk.get_block(local_x, surface_y, local_z);
        if !matches!(ground, BLOCK_GRASS | BLOCK_DIRT | BLOCK_SNOW) {
            continue;
        }

        Tree {
            local_x,
            base_y: surface_y + 1,
            local_z,
            trunk_height,
        }
        .generate_into_chunk(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkPos, BLOCK_STONE};
    use rand::SeedableRng;

    fn flat_grass_chunk() -> ChunkData {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                for y in 0..=40 {
                    let id = if y == 40 { BLOCK_GRASS } else { BLOCK_STONE };
                    chunk.set_block(x, y, z, id);
                }
            }
        }
        chunk
    }

    #[test]
    fn tree_places_trunk_and_leaves() {
        let mut chunk = flat_grass_chunk();
        let tree = Tree {
            local_x: 10,
            base_y: 41,
            local_z: 10,
            trunk_height: 5,
        };
        tree.generate_into_chunk(&mut chunk);

        for y in 41..=45 {
            assert_eq!(chunk.get_block(10, y, 10), BLOCK_LOG);
        }
        // Cluster center sits above the trunk top.
        assert_eq!(chunk.get_block(10, 46, 10), BLOCK_LEAVES);
        assert_eq!(chunk.get_block(12, 46, 10), BLOCK_LEAVES);
        // Beyond the taxicab radius stays air.
        assert_eq!(chunk.get_block(13, 46, 10), BLOCK_AIR);
    }

    #[test]
    fn leaves_do_not_overwrite_solid_blocks() {
        let mut chunk = flat_grass_chunk();
        chunk.set_block(11, 46, 10, BLOCK_STONE);
        Tree {
            local_x: 10,
            base_y: 41,
            local_z: 10,
            trunk_height: 5,
        }
        .generate_into_chunk(&mut chunk);
        assert_eq!(chunk.get_block(11, 46, 10), BLOCK_STONE);
    }

    #[test]
    fn edge_trees_stay_inside_the_chunk() {
        let mut chunk = flat_grass_chunk();
        Tree {
            local_x: 0,
            base_y: 41,
            local_z: 23,
            trunk_height: 4,
        }
        .generate_into_chunk(&mut chunk);
        // Nothing faults; the out-of-box leaf writes were skipped and the
        // trunk is intact.
        assert_eq!(chunk.get_block(0, 41, 23), BLOCK_LOG);
    }

    #[test]
    fn populate_is_deterministic_for_a_seed() {
        let mut a = flat_grass_chunk();
        let mut b = flat_grass_chunk();
        let mut rng_a = StdRng::seed_from_u64(9001);
        let mut rng_b = StdRng::seed_from_u64(9001);
        populate_trees(&mut a, &mut rng_a, 6);
        populate_trees(&mut b, &mut rng_b, 6);
        assert_eq!(a.words(), b.words());
    }

    #[test]
    fn trees_need_suitable_ground() {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                chunk.set_block(x, 10, z, BLOCK_STONE);
            }
        }
        let mut rng = StdRng::seed_from_u64(5);
        populate_trees(&mut chunk, &mut rng, 10);
        // Bare stone grows nothing.
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                assert_ne!(chunk.get_block(x, 11, z), BLOCK_LOG);
            }
        }
    }
}
