//! Read surfaces exposed to collaborators (physics, picker, renderer).
//!
//! Data-plane reads never fail: every accessor documents a default for
//! unloaded chunks and out-of-world coordinates.

use voxelforge_world::{ChunkData, ChunkPos, LightValue};

/// Sentinel returned by [`VoxelQuery::get_block_id`] for unloaded chunks.
/// It exists only at this boundary; in-memory storage always uses id 0 for
/// air.
pub const AIR_ABSENT: i32 = -1;

/// Voxel-level read access for collaborators.
pub trait VoxelQuery {
    /// Block id at a world position, or [`AIR_ABSENT`] when the owning
    /// chunk is not loaded.
    fn get_block_id(&self, wx: i32, wy: i32, wz: i32) -> i32;

    /// Whether the physics layer should collide at this position.
    /// Unloaded chunks and out-of-world positions are not solid.
    fn is_solid(&self, wx: i32, wy: i32, wz: i32) -> bool;

    /// Light absorption 0..=15 at this position; 0 for unloaded chunks.
    fn get_light_absorption(&self, wx: i32, wy: i32, wz: i32) -> u8;

    /// Borrow a loaded chunk.
    fn get_chunk(&self, coord: ChunkPos) -> Option<&ChunkData>;
}

/// Light-level read access for collaborators.
pub trait LightingQuery {
    /// Light at a world position. Unloaded chunks read as darkness,
    /// positions above the world as full sky, below the world as darkness.
    fn get_light(&self, wx: i32, wy: i32, wz: i32) -> LightValue;
}
