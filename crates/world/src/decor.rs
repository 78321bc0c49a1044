//! Surface decorators: sand patches and loose rocks.
//!
//! Decorators draw from per-chunk seeded RNG streams and only ever write
//! inside the chunk box.

use rand::rngs::StdRng;
use rand::Rng;

use crate::chunk::{
    ChunkData, BLOCK_AIR, BLOCK_DIRT, BLOCK_GRASS, BLOCK_ROCK, BLOCK_SAND, CHUNK_SIZE_X,
    CHUNK_SIZE_Y, CHUNK_SIZE_Z,
};

/// Stamp sand over grass/dirt surfaces in small taxicab disks.
pub fn stamp_sand_patches(chunk: &mut ChunkData, rng: &mut StdRng, attempts: u32) {
    for _ in 0..attempts {
        let center_x = rng.gen_range(0..CHUNK_SIZE_X as i32);
        let center_z = rng.gen_range(0..CHUNK_SIZE_Z as i32);
        let radius: i32 = rng.gen_range(2..=3);

        for dz in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() + dz.abs() > radius {
                    continue;
                }
                let (x, z) = (center_x + dx, center_z + dz);
                let Some(surface_y) = chunk.highest_solid(x, z) else {
                    continue;
                };
                if matches!(chunk.get_block(x, surface_y, z), BLOCK_GRASS | BLOCK_DIRT) {
                    chunk.set_block(x, surface_y, z, BLOCK_SAND);
                }
            }
        }
    }
}

/// Scatter single rocks (occasionally pairs) on solid surfaces.
pub fn scatter_rocks(chunk: &mut ChunkData, rng: &mut StdRng, attempts: u32) {
    for _ in 0..attempts {
        let x = rng.gen_range(0..CHUNK_SIZE_X as i32);
        let z = rng.gen_range(0..CHUNK_SIZE_Z as i32);
        let pair = rng.gen_range(0..3) == 0;

        let Some(surface_y) = chunk.highest_solid(x, z) else {
            continue;
        };
        let rock_y = surface_y + 1;
        if rock_y >= CHUNK_SIZE_Y as i32 || chunk.get_block(x, rock_y, z) != BLOCK_AIR {
            continue;
        }
        chunk.set_block(x, rock_y, z, BLOCK_ROCK);

        if pair {
            let (nx, nz) = if rng.gen_range(0..2) == 0 {
                (x + 1, z)
            } else {
                (x, z + 1)
            };
            // The companion only lands when the neighboring column's surface
            // is level with this one.
            if chunk.highest_solid(nx, nz) == Some(surface_y)
                && chunk.get_block(nx, rock_y, nz) == BLOCK_AIR
            {
                chunk.set_block(nx, rock_y, nz, BLOCK_ROCK);
            }
        }
    }
}
