//! Block catalog: immutable definitions of every block type the simulation
//! knows about, and the registry the lighting and meshing passes consult.

mod catalog;
mod registry;

pub use catalog::{builtin_registry, load_definitions};
pub use registry::{
    BlockCategory, BlockDefinition, BlockFace, BlockRegistry, BlockTextures, SideOverlay,
};

use thiserror::Error;
use voxelforge_world::BlockId;

/// Errors surfaced by the block catalog.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Lookup of an id that was never registered.
    #[error("unknown block id {0}")]
    UnknownBlock(BlockId),

    /// A definition reused an already-registered id.
    #[error("block id {0} registered twice")]
    DuplicateBlock(BlockId),

    /// Light absorption fraction outside [0, 1].
    #[error("block id {id}: light absorption {value} outside [0, 1]")]
    InvalidLightAbsorption { id: BlockId, value: f32 },

    /// An emissive channel above the light ceiling.
    #[error("block id {id}: emissive channel {value} exceeds 15")]
    InvalidEmission { id: BlockId, value: u8 },

    /// Malformed JSON block definitions.
    #[error("failed to parse block definitions: {0}")]
    Parse(#[from] serde_json::Error),
}
