//! Naive per-face chunk mesher.
//!
//! Every visible face becomes one unit quad with smooth light sampled from
//! the air-side voxel, a three-sample ambient occlusion term per corner,
//! per-face tinting with a world-position jitter, and an optional side
//! overlay gradient. Vertices are bucketed per material key
//! `"{blockId}:{faceIndex}"` so the renderer can bind one texture per
//! stream. Greedy merging is a future optimization and must reproduce these
//! outputs wherever neighbor light and block id match across a merged quad.

use std::collections::BTreeMap;

use blake3::Hasher;
use tracing::warn;
use voxelforge_assets::{BlockFace, BlockRegistry};
use voxelforge_world::{BlockId, BLOCK_AIR, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, MAX_LIGHT};

use crate::view::ChunkView;

/// Stable hash of the full stream set, for cache comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHash(pub [u8; 32]);

/// Four parallel attribute arrays for one material.
#[derive(Debug, Clone, Default)]
pub struct MeshStreams {
    /// Vertex positions, three floats per vertex, chunk-local; the consumer
    /// adds the chunk-origin translation.
    pub positions: Vec<f32>,
    /// Premultiplied vertex tint, three floats per vertex.
    pub colors: Vec<f32>,
    /// Texture coordinates, two floats per vertex.
    pub uvs: Vec<f32>,
    /// Triangle list indices into the stream's own vertices.
    pub indices: Vec<u16>,
}

impl MeshStreams {
    /// Number of vertices currently in the stream.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of quads currently in the stream.
    pub fn quad_count(&self) -> usize {
        self.vertex_count() / 4
    }

    fn push_quad(
        &mut self,
        corners: &[[f32; 3]; 4],
        colors: &[[f32; 3]; 4],
        uvs: &[[f32; 2]; 4],
        flip: bool,
    ) -> bool {
        let base = self.vertex_count();
        if base + 4 > usize::from(u16::MAX) {
            return false;
        }
        for i in 0..4 {
            self.positions.extend_from_slice(&corners[i]);
            self.colors.extend_from_slice(&colors[i]);
            self.uvs.extend_from_slice(&uvs[i]);
        }
        let base = base as u16;
        let order: [u16; 6] = if flip {
            [0, 2, 1, 0, 3, 2]
        } else {
            [0, 1, 2, 0, 2, 3]
        };
        for offset in order {
            self.indices.push(base + offset);
        }
        true
    }
}

/// Meshing output for one chunk: per-material streams plus a stable hash.
#[derive(Debug, Clone)]
pub struct ChunkMeshData {
    pub streams: BTreeMap<String, MeshStreams>,
    pub hash: MeshHash,
}

impl ChunkMeshData {
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Total quads across all material streams.
    pub fn quad_count(&self) -> usize {
        self.streams.values().map(MeshStreams::quad_count).sum()
    }
}

struct FaceGeometry {
    face: BlockFace,
    /// Offset from the voxel origin to corner 0.
    origin: [i32; 3],
    /// First tangent axis (runs along u / texture width).
    u: [i32; 3],
    /// Second tangent axis (runs along v / texture height).
    v: [i32; 3],
    /// Index winding flip keeping the triangles outward-facing.
    flip: bool,
}

const FACES: [FaceGeometry; 6] = [
    FaceGeometry {
        face: BlockFace::PosX,
        origin: [1, 0, 0],
        u: [0, 0, 1],
        v: [0, 1, 0],
        flip: true,
    },
    FaceGeometry {
        face: BlockFace::NegX,
        origin: [0, 0, 0],
        u: [0, 0, 1],
        v: [0, 1, 0],
        flip: false,
    },
    FaceGeometry {
        face: BlockFace::PosY,
        origin: [0, 1, 0],
        u: [1, 0, 0],
        v: [0, 0, 1],
        flip: true,
    },
    FaceGeometry {
        face: BlockFace::NegY,
        origin: [0, 0, 0],
        u: [1, 0, 0],
        v: [0, 0, 1],
        flip: false,
    },
    FaceGeometry {
        face: BlockFace::PosZ,
        origin: [0, 0, 1],
        u: [1, 0, 0],
        v: [0, 1, 0],
        flip: false,
    },
    FaceGeometry {
        face: BlockFace::NegZ,
        origin: [0, 0, 0],
        u: [1, 0, 0],
        v: [0, 1, 0],
        flip: true,
    },
];

// Corner order (u, v): bottom edge first, counter-clockwise in uv space.
const CORNERS: [(i32, i32); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];

/// Decide whether the face of `current` toward `neighbor` is drawn.
///
/// Air always reveals the face; opaque neighbors always hide it; a
/// transparent neighbor hides only the face of a transparent block of the
/// same id (internal glass-glass and leaf-leaf quads).
fn face_visible(registry: &BlockRegistry, current: BlockId, neighbor: BlockId) -> bool {
    if neighbor == BLOCK_AIR {
        return true;
    }
    if registry.is_opaque(neighbor) {
        return false;
    }
    if registry.is_opaque(current) {
        return true;
    }
    neighbor != current
}

/// AO occluder test: a voxel occludes iff it is registered and
/// non-transparent.
fn ao_opaque(registry: &BlockRegistry, id: BlockId) -> bool {
    registry.get(id).map(|def| !def.transparent).unwrap_or(false)
}

/// Splitmix-style 32-bit mix of a world position, used for the face tint
/// jitter.
fn position_hash(wx: i32, wy: i32, wz: i32) -> u32 {
    let mut h = (wx as u32)
        .wrapping_mul(374_761_393)
        .wrapping_add((wy as u32).wrapping_mul(668_265_263))
        .wrapping_add((wz as u32).wrapping_mul(3_266_489_917));
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

/// Per-face brightness factor with the world-position jitter folded in:
/// top +12%, bottom -25%, sides -4%, jitter +/-4%, clamped at 0.5.
fn face_tint(face: BlockFace, wx: i32, wy: i32, wz: i32) -> f32 {
    let factor = match face {
        BlockFace::PosY => 1.12,
        BlockFace::NegY => 0.75,
        _ => 0.96,
    };
    let unit = position_hash(wx, wy, wz) as f32 / u32::MAX as f32;
    let jitter = unit * 0.08 - 0.04;
    (factor * (1.0 + jitter)).max(0.5)
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Mesh the interior of the view's center chunk.
pub fn mesh_chunk(view: &ChunkView<'_>, registry: &BlockRegistry) -> ChunkMeshData {
    let mut streams: BTreeMap<String, MeshStreams> = BTreeMap::new();
    let (origin_x, origin_z) = view.center.position().origin();
    let mut overflowed = false;

    for y in 0..CHUNK_SIZE_Y as i32 {
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                let id = view.center.get_block(x, y, z);
                if id == BLOCK_AIR {
                    continue;
                }
                for geometry in &FACES {
                    emit_face(
                        view,
                        registry,
                        &mut streams,
                        geometry,
                        id,
                        [x, y, z],
                        [origin_x + x, y, origin_z + z],
                        &mut overflowed,
                    );
                }
            }
        }
    }

    streams.retain(|_, stream| !stream.indices.is_empty());
    let hash = hash_streams(&streams);
    ChunkMeshData { streams, hash }
}

#[allow(clippy::too_many_arguments)]
fn emit_face(
    view: &ChunkView<'_>,
    registry: &BlockRegistry,
    streams: &mut BTreeMap<String, MeshStreams>,
    geometry: &FaceGeometry,
    id: BlockId,
    local: [i32; 3],
    world: [i32; 3],
    overflowed: &mut bool,
) {
    let normal = geometry.face.normal();
    let air_side = [
        local[0] + normal[0],
        local[1] + normal[1],
        local[2] + normal[2],
    ];
    let neighbor = view.block(air_side[0], air_side[1], air_side[2]);
    if !face_visible(registry, id, neighbor) {
        return;
    }

    // One light sample per face, from the voxel the face looks into.
    let light = view.light(air_side[0], air_side[1], air_side[2]);
    let combined = light.combined();
    let light_norm = [
        f32::from(combined[0]) / f32::from(MAX_LIGHT),
        f32::from(combined[1]) / f32::from(MAX_LIGHT),
        f32::from(combined[2]) / f32::from(MAX_LIGHT),
    ];

    let base_color = registry
        .face_color(id, geometry.face)
        .unwrap_or([1.0, 1.0, 1.0]);
    let overlay = if geometry.face.is_side() {
        registry.get(id).and_then(|def| def.side_overlay)
    } else {
        None
    };
    let tint = face_tint(geometry.face, world[0], world[1], world[2]);

    let mut corners = [[0.0f32; 3]; 4];
    let mut colors = [[0.0f32; 3]; 4];
    let mut uvs = [[0.0f32; 2]; 4];

    for (ci, &(cu, cv)) in CORNERS.iter().enumerate() {
        corners[ci] = [
            (local[0] + geometry.origin[0] + cu * geometry.u[0] + cv * geometry.v[0]) as f32,
            (local[1] + geometry.origin[1] + cu * geometry.u[1] + cv * geometry.v[1]) as f32,
            (local[2] + geometry.origin[2] + cu * geometry.u[2] + cv * geometry.v[2]) as f32,
        ];
        uvs[ci] = [cu as f32, cv as f32];

        // Three occlusion samples on the air side of the vertex.
        let su = if cu == 0 { -1 } else { 1 };
        let sv = if cv == 0 { -1 } else { 1 };
        let side1 = ao_opaque(
            registry,
            view.block(
                air_side[0] + su * geometry.u[0],
                air_side[1] + su * geometry.u[1],
                air_side[2] + su * geometry.u[2],
            ),
        );
        let side2 = ao_opaque(
            registry,
            view.block(
                air_side[0] + sv * geometry.v[0],
                air_side[1] + sv * geometry.v[1],
                air_side[2] + sv * geometry.v[2],
            ),
        );
        let corner = ao_opaque(
            registry,
            view.block(
                air_side[0] + su * geometry.u[0] + sv * geometry.v[0],
                air_side[1] + su * geometry.u[1] + sv * geometry.v[1],
                air_side[2] + su * geometry.u[2] + sv * geometry.v[2],
            ),
        );
        let raw_ao = if side1 && side2 {
            0
        } else {
            3 - i32::from(side1) - i32::from(side2) - i32::from(corner)
        };
        let ao = 0.7 + raw_ao as f32 / 6.0;

        // Side overlay: blend toward the overlay color over the top
        // `height` fraction of the face (v runs along local Y on sides).
        let color = match overlay {
            Some(over) if over.height > 0.0 => {
                let t = ((cv as f32 - (1.0 - over.height)) / over.height).clamp(0.0, 1.0);
                lerp3(base_color, over.color, t)
            }
            _ => base_color,
        };

        colors[ci] = [
            light_norm[0] * ao * color[0] * tint,
            light_norm[1] * ao * color[1] * tint,
            light_norm[2] * ao * color[2] * tint,
        ];
    }

    let key = format!("{}:{}", id, geometry.face.index());
    let stream = streams.entry(key).or_default();
    if !stream.push_quad(&corners, &colors, &uvs, geometry.flip) && !*overflowed {
        *overflowed = true;
        warn!(
            chunk = %view.center.position(),
            "material stream exceeded u16 index space; dropping further quads"
        );
    }
}

fn hash_streams(streams: &BTreeMap<String, MeshStreams>) -> MeshHash {
    let mut hasher = Hasher::new();
    for (key, stream) in streams {
        hasher.update(key.as_bytes());
        hasher.update(bytemuck::cast_slice(&stream.positions));
        hasher.update(bytemuck::cast_slice(&stream.colors));
        hasher.update(bytemuck::cast_slice(&stream.uvs));
        hasher.update(bytemuck::cast_slice(&stream.indices));
    }
    MeshHash(*hasher.finalize().as_bytes())
}
