//! Event bus for world pipeline notifications.
//!
//! The duck-typed payloads of a dynamic event system become one closed sum
//! type here; collaborators drain the bus on their own schedule. Publishing
//! never blocks: when the channel is full the event is dropped with a
//! warning.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::warn;
use voxelforge_mesh::ChunkMeshData;
use voxelforge_world::{BlockId, ChunkPos};

/// Everything the world core announces to the outside.
#[derive(Clone)]
pub enum WorldEvent {
    /// Terrain for a chunk landed in the store.
    ChunkGenerated { coord: ChunkPos, radius: i32 },
    /// Both lighting passes finished; the buffer is the updated wire copy.
    LightingCalculated {
        coord: ChunkPos,
        buffer: Arc<Vec<u8>>,
    },
    /// A fresh mesh is ready for upload.
    ChunkMeshBuilt {
        coord: ChunkPos,
        mesh: Arc<ChunkMeshData>,
    },
    /// The chunk left the keep-set and was dropped.
    ChunkUnloaded { coord: ChunkPos },
    /// A block edit wrote a non-air id.
    BlockPlaced {
        pos: [i32; 3],
        id: BlockId,
        chunk: ChunkPos,
    },
    /// A block edit wrote air over a non-air id.
    BlockRemoved {
        pos: [i32; 3],
        id: BlockId,
        chunk: ChunkPos,
    },
}

impl WorldEvent {
    /// Stable kind label for logging and filtering.
    pub fn kind(&self) -> &'static str {
        match self {
            WorldEvent::ChunkGenerated { .. } => "chunk_generated",
            WorldEvent::LightingCalculated { .. } => "lighting_calculated",
            WorldEvent::ChunkMeshBuilt { .. } => "chunk_mesh_built",
            WorldEvent::ChunkUnloaded { .. } => "chunk_unloaded",
            WorldEvent::BlockPlaced { .. } => "block_placed",
            WorldEvent::BlockRemoved { .. } => "block_removed",
        }
    }

    /// The chunk the event concerns.
    pub fn coord(&self) -> ChunkPos {
        match self {
            WorldEvent::ChunkGenerated { coord, .. }
            | WorldEvent::LightingCalculated { coord, .. }
            | WorldEvent::ChunkMeshBuilt { coord, .. }
            | WorldEvent::ChunkUnloaded { coord } => *coord,
            WorldEvent::BlockPlaced { chunk, .. } | WorldEvent::BlockRemoved { chunk, .. } => {
                *chunk
            }
        }
    }
}

impl fmt::Debug for WorldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldEvent::LightingCalculated { coord, buffer } => f
                .debug_struct("LightingCalculated")
                .field("coord", coord)
                .field("buffer_len", &buffer.len())
                .finish(),
            WorldEvent::ChunkMeshBuilt { coord, mesh } => f
                .debug_struct("ChunkMeshBuilt")
                .field("coord", coord)
                .field("streams", &mesh.streams.len())
                .field("quads", &mesh.quad_count())
                .finish(),
            WorldEvent::ChunkGenerated { coord, radius } => f
                .debug_struct("ChunkGenerated")
                .field("coord", coord)
                .field("radius", radius)
                .finish(),
            WorldEvent::ChunkUnloaded { coord } => {
                f.debug_struct("ChunkUnloaded").field("coord", coord).finish()
            }
            WorldEvent::BlockPlaced { pos, id, chunk } => f
                .debug_struct("BlockPlaced")
                .field("pos", pos)
                .field("id", id)
                .field("chunk", chunk)
                .finish(),
            WorldEvent::BlockRemoved { pos, id, chunk } => f
                .debug_struct("BlockRemoved")
                .field("pos", pos)
                .field("id", id)
                .field("chunk", chunk)
                .finish(),
        }
    }
}

/// Bounded broadcast channel the coordinator publishes into.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<WorldEvent>,
    receiver: Receiver<WorldEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Create a bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publish an event; dropped with a warning when the bus is full.
    pub fn publish(&self, event: WorldEvent) {
        if let Err(err) = self.sender.try_send(event) {
            warn!(kind = err.into_inner().kind(), "event bus full; dropping event");
        }
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Number of events waiting in the bus.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Channel capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
