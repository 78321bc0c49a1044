//! voxelforge: the world-simulation core of a block sandbox.
//!
//! The library surface is the [`WorldOrchestrator`]: it owns the chunk
//! store, drives terrain/lighting/meshing through worker pools, and
//! announces progress on a typed event bus. The simulation passes
//! themselves live in the `voxelforge-world`, `voxelforge-assets` and
//! `voxelforge-mesh` crates.

pub mod config;
pub mod events;
pub mod orchestrator;
pub mod query;
pub mod workers;

pub use config::EngineConfig;
pub use events::{EventBus, WorldEvent};
pub use orchestrator::{Command, DirtyReason, WorldOrchestrator};
pub use query::{LightingQuery, VoxelQuery, AIR_ABSENT};

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use voxelforge_assets::{AssetError, BlockRegistry};
use voxelforge_world::{ChunkPos, WorldError};

/// Errors surfaced by the engine's command plane and workers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A worker task panicked or failed; the task was dropped and the chunk
    /// keeps its prior state.
    #[error("worker task failed: {0}")]
    WorkerTaskFailed(String),

    /// An edit targeted a chunk that is not resident.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkPos),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

static REGISTRY: OnceLock<Arc<BlockRegistry>> = OnceLock::new();

/// Install the process-wide block registry.
///
/// Called once before any worker pool starts; afterwards the registry is
/// read-only everywhere. Returns the installed handle (the first
/// installation wins).
pub fn install_registry(registry: BlockRegistry) -> Arc<BlockRegistry> {
    REGISTRY.get_or_init(|| Arc::new(registry)).clone()
}

/// The installed registry, if any.
pub fn shared_registry() -> Option<Arc<BlockRegistry>> {
    REGISTRY.get().cloned()
}
