//! Chunk meshing: converts lit voxel data into per-material vertex streams
//! ready for GPU upload.

mod mesh;
mod view;

pub use mesh::{mesh_chunk, ChunkMeshData, MeshHash, MeshStreams};
pub use view::ChunkView;
