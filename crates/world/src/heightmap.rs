//! Height field generation for terrain.
//!
//! Combines a broad detail layer and a fine ridge layer sampled at four
//! times the frequency:
//! `h = BASE_HEIGHT + AMP_DETAIL * N1(x*f, z*f) + AMP_RIDGE * N2(x*4f, z*4f)`.

use crate::chunk::{ChunkPos, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use crate::noise::OctaveNoise;

/// Ground level the height field oscillates around.
pub const BASE_HEIGHT: i32 = 64;

/// Amplitude of the broad detail layer.
pub const AMP_DETAIL: f64 = 28.0;

/// Amplitude of the fine ridge layer.
pub const AMP_RIDGE: f64 = 6.0;

/// Lowest height a column may generate at (bedrock must stay covered).
pub const MIN_HEIGHT: i32 = 1;

/// Highest height a column may generate at.
pub const MAX_HEIGHT: i32 = CHUNK_SIZE_Y as i32 - 1;

/// Base frequency of the broad detail layer; the ridge layer samples the
/// world at four times this.
const DETAIL_FREQUENCY: f64 = 0.01;

/// Seed offset keeping the ridge stream independent of the detail stream.
const RIDGE_SEED_OFFSET: u32 = 1000;

/// Pure height sampler over world columns.
pub struct HeightSampler {
    detail: OctaveNoise,
    ridge: OctaveNoise,
}

impl HeightSampler {
    /// Create a height sampler from the world seed.
    pub fn new(world_seed: u64) -> Self {
        let seed = world_seed as u32;
        Self {
            detail: OctaveNoise::new(seed, 4, DETAIL_FREQUENCY),
            ridge: OctaveNoise::new(
                seed.wrapping_add(RIDGE_SEED_OFFSET),
                2,
                DETAIL_FREQUENCY * 4.0,
            ),
        }
    }

    /// Terrain height at a world column, clamped to [MIN_HEIGHT, MAX_HEIGHT].
    pub fn height_at(&self, world_x: i32, world_z: i32) -> i32 {
        let detail = self.detail.sample(world_x as f64, world_z as f64);
        let ridge = self.ridge.sample(world_x as f64, world_z as f64);
        let height = BASE_HEIGHT + (AMP_DETAIL * detail + AMP_RIDGE * ridge) as i32;
        height.clamp(MIN_HEIGHT, MAX_HEIGHT)
    }
}

// Heights are stored with a one-column margin on every side so the cliff
// test can look across chunk borders without a second chunk in hand.
const MARGIN_X: usize = CHUNK_SIZE_X + 2;
const MARGIN_Z: usize = CHUNK_SIZE_Z + 2;

/// Heightmap for a single chunk, with a one-column border margin.
pub struct Heightmap {
    /// Indexed as heights[z + 1][x + 1] for local coords in -1..=24.
    heights: Vec<i32>,
}

impl Heightmap {
    /// Generate the heightmap for a chunk, margin included.
    pub fn generate(sampler: &HeightSampler, pos: ChunkPos) -> Self {
        let (origin_x, origin_z) = pos.origin();
        let mut heights = vec![0i32; MARGIN_X * MARGIN_Z];
        for mz in 0..MARGIN_Z {
            for mx in 0..MARGIN_X {
                let world_x = origin_x + mx as i32 - 1;
                let world_z = origin_z + mz as i32 - 1;
                heights[mz * MARGIN_X + mx] = sampler.height_at(world_x, world_z);
            }
        }
        Self { heights }
    }

    /// Height at a chunk-local column; the margin admits -1..=24 on each axis.
    ///
    /// # Panics
    /// Panics if the coordinate falls outside the margin.
    pub fn get(&self, local_x: i32, local_z: i32) -> i32 {
        assert!((-1..=CHUNK_SIZE_X as i32).contains(&local_x), "local_x out of margin");
        assert!((-1..=CHUNK_SIZE_Z as i32).contains(&local_z), "local_z out of margin");
        self.heights[(local_z + 1) as usize * MARGIN_X + (local_x + 1) as usize]
    }

    /// Largest absolute height difference to the four orthogonal neighbors.
    pub fn max_neighbor_delta(&self, local_x: i32, local_z: i32) -> i32 {
        let h = self.get(local_x, local_z);
        [
            self.get(local_x + 1, local_z),
            self.get(local_x - 1, local_z),
            self.get(local_x, local_z + 1),
            self.get(local_x, local_z - 1),
        ]
        .iter()
        .map(|n| (n - h).abs())
        .max()
        .unwrap_or(0)
    }

    /// Minimum interior height.
    pub fn min_height(&self) -> i32 {
        self.interior().min().unwrap_or(MIN_HEIGHT)
    }

    /// Maximum interior height.
    pub fn max_height(&self) -> i32 {
        self.interior().max().unwrap_or(MAX_HEIGHT)
    }

    /// Average interior height.
    pub fn avg_height(&self) -> f32 {
        let sum: i32 = self.interior().sum();
        sum as f32 / (CHUNK_SIZE_X * CHUNK_SIZE_Z) as f32
    }

    fn interior(&self) -> impl Iterator<Item = i32> + '_ {
        (0..CHUNK_SIZE_Z as i32).flat_map(move |z| {
            (0..CHUNK_SIZE_X as i32).map(move |x| self.get(x, z))
        })
    }
}
