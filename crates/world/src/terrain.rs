//! Terrain generation integrating the height field and biome systems.
//!
//! A chunk is a pure function of (world seed, chunk position): height and
//! biome maps drive the column fill, then the surface decorators run in a
//! fixed order from per-chunk seeded RNG streams.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::biome::{BiomeAssigner, BiomeData};
use crate::chunk::{
    ChunkData, ChunkPos, BLOCK_BEDROCK, BLOCK_STONE, CHUNK_SIZE_X, CHUNK_SIZE_Z,
};
use crate::decor::{scatter_rocks, stamp_sand_patches};
use crate::heightmap::{HeightSampler, Heightmap};
use crate::trees::populate_trees;

/// Height delta to any orthogonal neighbor at which a column becomes a
/// stone cliff face instead of biome surface.
const CLIFF_DELTA: i32 = 4;

// Decorator RNG stream salts, mixed into the per-chunk seed so each
// decorator draws an independent deterministic stream.
const SALT_SAND: u64 = 0x53414E44; // "SAND"
const SALT_TREE: u64 = 0x54524545; // "TREE"
const SALT_ROCK: u64 = 0x524F434B; // "ROCK"

/// Per-chunk decorator seed: `seed ^ 374761393*cx ^ 668265263*cz ^ salt`.
fn chunk_stream_seed(world_seed: u64, pos: ChunkPos, salt: u64) -> u64 {
    world_seed
        ^ (pos.x as i64 as u64).wrapping_mul(374_761_393)
        ^ (pos.z as i64 as u64).wrapping_mul(668_265_263)
        ^ salt
}

/// Deterministic (seed, chunk position) -> populated chunk generator.
pub struct TerrainGenerator {
    world_seed: u64,
    biome_assigner: BiomeAssigner,
    height_sampler: HeightSampler,
}

impl TerrainGenerator {
    /// Create a new terrain generator from the world seed.
    pub fn new(world_seed: u64) -> Self {
        Self {
            world_seed,
            biome_assigner: BiomeAssigner::new(world_seed),
            height_sampler: HeightSampler::new(world_seed),
        }
    }

    pub fn world_seed(&self) -> u64 {
        self.world_seed
    }

    /// Generate terrain for a chunk at the given position.
    #[instrument(skip(self), fields(chunk_pos = %chunk_pos, world_seed = self.world_seed))]
    pub fn generate_chunk(&self, chunk_pos: ChunkPos) -> ChunkData {
        debug!("Starting terrain generation");
        let mut chunk = ChunkData::new(chunk_pos);

        let heightmap = Heightmap::generate(&self.height_sampler, chunk_pos);
        let (origin_x, origin_z) = chunk_pos.origin();

        for local_z in 0..CHUNK_SIZE_Z as i32 {
            for local_x in 0..CHUNK_SIZE_X as i32 {
                let world_x = origin_x + local_x;
                let world_z = origin_z + local_z;

                let height = heightmap.get(local_x, local_z);
                let biome = BiomeData::get(self.biome_assigner.biome_at(world_x, world_z));

                // Steep columns expose bare stone instead of biome surface.
                let surface =
                    if heightmap.max_neighbor_delta(local_x, local_z) >= CLIFF_DELTA {
                        BLOCK_STONE
                    } else {
                        biome.surface
                    };

                chunk.set_block(local_x, 0, local_z, BLOCK_BEDROCK);
                for y in 1..height {
                    let id = if y < height - 4 {
                        biome.stone
                    } else {
                        biome.subsurface
                    };
                    chunk.set_block(local_x, y, local_z, id);
                }
                chunk.set_block(local_x, height, local_z, surface);
            }
        }

        self.decorate(&mut chunk, chunk_pos);

        debug!(solid = chunk.solid_count(), "Terrain generation complete");
        chunk
    }

    /// Run the surface decorators in their fixed order:
    /// sand patches, then trees, then rocks.
    fn decorate(&self, chunk: &mut ChunkData, chunk_pos: ChunkPos) {
        let (origin_x, origin_z) = chunk_pos.origin();
        let center_biome = BiomeData::get(self.biome_assigner.biome_at(
            origin_x + CHUNK_SIZE_X as i32 / 2,
            origin_z + CHUNK_SIZE_Z as i32 / 2,
        ));

        let mut sand_rng =
            StdRng::seed_from_u64(chunk_stream_seed(self.world_seed, chunk_pos, SALT_SAND));
        stamp_sand_patches(chunk, &mut sand_rng, center_biome.sand_patch_attempts);

        let mut tree_rng =
            StdRng::seed_from_u64(chunk_stream_seed(self.world_seed, chunk_pos, SALT_TREE));
        populate_trees(chunk, &mut tree_rng, center_biome.tree_attempts);

        let mut rock_rng =
            StdRng::seed_from_u64(chunk_stream_seed(self.world_seed, chunk_pos, SALT_ROCK));
        scatter_rocks(chunk, &mut rock_rng, center_biome.rock_attempts);
    }
}
