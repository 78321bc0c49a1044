//! Biome system for terrain generation.
//!
//! Assigns biomes from temperature and humidity noise: each world column
//! samples a (T, H) pair and takes the biome whose reference point is
//! nearest in (T, H) space.

use crate::chunk::{
    BlockId, BLOCK_DIRT, BLOCK_GRASS, BLOCK_SAND, BLOCK_SNOW, BLOCK_STONE,
};
use crate::noise::OctaveNoise;
use serde::{Deserialize, Serialize};

/// Frequency of the climate fields (bands several chunks wide).
const CLIMATE_FREQUENCY: f64 = 0.008;

// Independent seed streams for the two climate axes.
const TEMPERATURE_SEED_OFFSET: u32 = 3000;
const HUMIDITY_SEED_OFFSET: u32 = 4000;

/// Biome identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BiomeId {
    Plains,
    Forest,
    Desert,
    Tundra,
    Mountains,
}

impl BiomeId {
    /// Canonical lowercase string key for configs/logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            BiomeId::Plains => "plains",
            BiomeId::Forest => "forest",
            BiomeId::Desert => "desert",
            BiomeId::Tundra => "tundra",
            BiomeId::Mountains => "mountains",
        }
    }

    /// Get all biome IDs (for iteration).
    pub fn all() -> &'static [BiomeId] {
        &[
            BiomeId::Plains,
            BiomeId::Forest,
            BiomeId::Desert,
            BiomeId::Tundra,
            BiomeId::Mountains,
        ]
    }
}

/// Biome data with properties for generation.
#[derive(Debug, Clone)]
pub struct BiomeData {
    pub id: BiomeId,
    /// Temperature reference point [0.0, 1.0] (0=cold, 1=hot)
    pub temperature: f32,
    /// Humidity reference point [0.0, 1.0] (0=dry, 1=wet)
    pub humidity: f32,
    /// Topmost block of a normal (non-cliff) column.
    pub surface: BlockId,
    /// Layer directly under the surface (4 blocks deep).
    pub subsurface: BlockId,
    /// Filler below the subsurface layer.
    pub stone: BlockId,
    /// Tree placement attempts per chunk.
    pub tree_attempts: u32,
    /// Sand patch stamp attempts per chunk.
    pub sand_patch_attempts: u32,
    /// Loose rock placement attempts per chunk.
    pub rock_attempts: u32,
}

impl BiomeData {
    /// Get biome data for a specific biome ID.
    pub fn get(id: BiomeId) -> Self {
        match id {
            BiomeId::Plains => Self {
                id,
                temperature: 0.55,
                humidity: 0.45,
                surface: BLOCK_GRASS,
                subsurface: BLOCK_DIRT,
                stone: BLOCK_STONE,
                tree_attempts: 2,
                sand_patch_attempts: 1,
                rock_attempts: 1,
            },
            BiomeId::Forest => Self {
                id,
                temperature: 0.5,
                humidity: 0.75,
                surface: BLOCK_GRASS,
                subsurface: BLOCK_DIRT,
                stone: BLOCK_STONE,
                tree_attempts: 8,
                sand_patch_attempts: 0,
                rock_attempts: 0,
            },
            BiomeId::Desert => Self {
                id,
                temperature: 0.9,
                humidity: 0.1,
                surface: BLOCK_SAND,
                subsurface: BLOCK_SAND,
                stone: BLOCK_STONE,
                tree_attempts: 0,
                sand_patch_attempts: 3,
                rock_attempts: 1,
            },
            BiomeId::Tundra => Self {
                id,
                temperature: 0.1,
                humidity: 0.4,
                surface: BLOCK_SNOW,
                subsurface: BLOCK_DIRT,
                stone: BLOCK_STONE,
                tree_attempts: 1,
                sand_patch_attempts: 0,
                rock_attempts: 2,
            },
            BiomeId::Mountains => Self {
                id,
                temperature: 0.3,
                humidity: 0.3,
                surface: BLOCK_STONE,
                subsurface: BLOCK_STONE,
                stone: BLOCK_STONE,
                tree_attempts: 0,
                sand_patch_attempts: 0,
                rock_attempts: 4,
            },
        }
    }
}

/// Assigns biomes to world columns from temperature/humidity noise.
pub struct BiomeAssigner {
    temperature: OctaveNoise,
    humidity: OctaveNoise,
}

impl BiomeAssigner {
    /// Create a new biome assigner from the world seed.
    pub fn new(world_seed: u64) -> Self {
        let seed = world_seed as u32;
        Self {
            temperature: OctaveNoise::new(
                seed.wrapping_add(TEMPERATURE_SEED_OFFSET),
                3,
                CLIMATE_FREQUENCY,
            ),
            humidity: OctaveNoise::new(
                seed.wrapping_add(HUMIDITY_SEED_OFFSET),
                3,
                CLIMATE_FREQUENCY,
            ),
        }
    }

    /// Sample the raw (temperature, humidity) pair at a world column.
    pub fn climate_at(&self, world_x: i32, world_z: i32) -> (f32, f32) {
        let t = self
            .temperature
            .unit_sample(world_x as f64, world_z as f64) as f32;
        let h = self.humidity.unit_sample(world_x as f64, world_z as f64) as f32;
        (t, h)
    }

    /// Nearest biome to the sampled climate in (T, H) space.
    pub fn biome_at(&self, world_x: i32, world_z: i32) -> BiomeId {
        let (t, h) = self.climate_at(world_x, world_z);

        let mut best = BiomeId::Plains;
        let mut best_dist = f32::INFINITY;
        for &id in BiomeId::all() {
            let data = BiomeData::get(id);
            let dt = data.temperature - t;
            let dh = data.humidity - h;
            let dist = dt * dt + dh * dh;
            if dist < best_dist {
                best = id;
                best_dist = dist;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biome_assignment_is_deterministic() {
        let a = BiomeAssigner::new(42);
        let b = BiomeAssigner::new(42);
        for x in -20..20 {
            for z in -20..20 {
                assert_eq!(a.biome_at(x * 13, z * 17), b.biome_at(x * 13, z * 17));
            }
        }
    }

    #[test]
    fn nearest_biome_matches_reference_points() {
        // Each biome's own (T, H) reference point must map back to itself.
        for &id in BiomeId::all() {
            let data = BiomeData::get(id);
            let mut best = BiomeId::Plains;
            let mut best_dist = f32::INFINITY;
            for &candidate in BiomeId::all() {
                let c = BiomeData::get(candidate);
                let dt = c.temperature - data.temperature;
                let dh = c.humidity - data.humidity;
                let dist = dt * dt + dh * dh;
                if dist < best_dist {
                    best = candidate;
                    best_dist = dist;
                }
            }
            assert_eq!(best, id);
        }
    }

    #[test]
    fn biome_table_covers_every_id() {
        for &id in BiomeId::all() {
            let data = BiomeData::get(id);
            assert_eq!(data.id, id);
            assert!((0.0..=1.0).contains(&data.temperature));
            assert!((0.0..=1.0).contains(&data.humidity));
        }
    }

    #[test]
    fn climate_is_in_unit_range() {
        let assigner = BiomeAssigner::new(7);
        for x in 0..32 {
            for z in 0..32 {
                let (t, h) = assigner.climate_at(x * 7, z * 11);
                assert!((0.0..=1.0).contains(&t));
                assert!((0.0..=1.0).contains(&h));
            }
        }
    }
}
