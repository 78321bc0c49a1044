use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::warn;
use voxelforge_world::lighting::BlockLightProfile;
use voxelforge_world::{BlockId, BLOCK_AIR, MAX_LIGHT};

use crate::AssetError;

/// The six axis-aligned block faces, in wire order:
/// +X=0, -X=1, +Y=2, -Y=3, +Z=4, -Z=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockFace {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl BlockFace {
    /// All faces in index order.
    pub const ALL: [BlockFace; 6] = [
        BlockFace::PosX,
        BlockFace::NegX,
        BlockFace::PosY,
        BlockFace::NegY,
        BlockFace::PosZ,
        BlockFace::NegZ,
    ];

    /// Face index used in material keys and texture arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Outward unit normal.
    pub const fn normal(self) -> [i32; 3] {
        match self {
            BlockFace::PosX => [1, 0, 0],
            BlockFace::NegX => [-1, 0, 0],
            BlockFace::PosY => [0, 1, 0],
            BlockFace::NegY => [0, -1, 0],
            BlockFace::PosZ => [0, 0, 1],
            BlockFace::NegZ => [0, 0, -1],
        }
    }

    /// True for the four lateral faces (side overlays apply only to these).
    pub const fn is_side(self) -> bool {
        !matches!(self, BlockFace::PosY | BlockFace::NegY)
    }
}

/// Broad grouping for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Natural,
    Vegetation,
    Liquid,
    Crafted,
}

/// How a block's faces map onto texture names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTextures {
    /// One texture on all six faces.
    Single(String),
    /// One texture per face, in face-index order.
    PerFace([String; 6]),
    /// Lateral faces share one texture; top and bottom have their own.
    SideTopBottom {
        side: String,
        top: String,
        bottom: String,
    },
}

impl BlockTextures {
    /// Resolve the texture for a face.
    pub fn texture_for(&self, face: BlockFace) -> &str {
        match self {
            BlockTextures::Single(name) => name,
            BlockTextures::PerFace(names) => &names[face.index()],
            BlockTextures::SideTopBottom { side, top, bottom } => match face {
                BlockFace::PosY => top,
                BlockFace::NegY => bottom,
                _ => side,
            },
        }
    }
}

/// Vertical color gradient painted over the top fraction of side faces
/// (e.g. the grass fringe on dirt sides).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideOverlay {
    pub color: [f32; 3],
    /// Fraction of the face height the overlay covers, from the top.
    pub height: f32,
}

fn default_collidable() -> bool {
    true
}

/// Immutable description of one block type. Registered once, read-only
/// everywhere afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: BlockId,
    pub name: String,
    pub category: BlockCategory,
    /// Transparent blocks let light through at their declared absorption.
    #[serde(default)]
    pub transparent: bool,
    #[serde(default = "default_collidable")]
    pub collidable: bool,
    /// Fraction [0, 1] of light absorbed per traversal; only meaningful for
    /// transparent blocks (opaque blocks always absorb everything).
    #[serde(default)]
    pub light_absorption: f32,
    /// Block-light emitted per channel (0-15).
    #[serde(default)]
    pub emissive: [u8; 3],
    pub textures: BlockTextures,
    /// Tint applied to every face unless overridden per face.
    #[serde(default)]
    pub base_color: Option<[f32; 3]>,
    /// Per-face tint overrides, in face-index order.
    #[serde(default)]
    pub face_colors: [Option<[f32; 3]>; 6],
    #[serde(default)]
    pub side_overlay: Option<SideOverlay>,
    /// Inventory/icon texture, when it differs from the face textures.
    #[serde(default)]
    pub icon: Option<String>,
}

/// Append-only block catalog.
///
/// Installed once before the worker pools start; every lookup after that is
/// read-only, so the registry is shared freely across threads.
#[derive(Debug)]
pub struct BlockRegistry {
    blocks: BTreeMap<BlockId, BlockDefinition>,
    unknown_logged: AtomicBool,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
            unknown_logged: AtomicBool::new(false),
        }
    }

    /// Build a registry from a list of definitions.
    pub fn from_definitions(defs: Vec<BlockDefinition>) -> Result<Self, AssetError> {
        let mut registry = Self::new();
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Register one definition. Ids are unique; light fields are validated.
    pub fn register(&mut self, def: BlockDefinition) -> Result<(), AssetError> {
        if self.blocks.contains_key(&def.id) {
            return Err(AssetError::DuplicateBlock(def.id));
        }
        if !(0.0..=1.0).contains(&def.light_absorption) {
            return Err(AssetError::InvalidLightAbsorption {
                id: def.id,
                value: def.light_absorption,
            });
        }
        if let Some(&value) = def.emissive.iter().find(|&&v| v > MAX_LIGHT) {
            return Err(AssetError::InvalidEmission { id: def.id, value });
        }
        self.blocks.insert(def.id, def);
        Ok(())
    }

    /// Number of registered blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Fetch a definition, or `UnknownBlock` for an unregistered id.
    pub fn definition(&self, id: BlockId) -> Result<&BlockDefinition, AssetError> {
        self.blocks.get(&id).ok_or(AssetError::UnknownBlock(id))
    }

    /// Fetch a definition without the error path.
    pub fn get(&self, id: BlockId) -> Option<&BlockDefinition> {
        self.blocks.get(&id)
    }

    /// Iterate definitions of one category, in id order.
    pub fn by_category(
        &self,
        category: BlockCategory,
    ) -> impl Iterator<Item = &BlockDefinition> + '_ {
        self.blocks
            .values()
            .filter(move |def| def.category == category)
    }

    /// Propagation cost of a block: air 0, opaque 15, transparent
    /// `floor(light_absorption * 15)`.
    ///
    /// A non-transparent block absorbs everything regardless of its
    /// declared fraction.
    pub fn absorption(&self, id: BlockId) -> Result<u8, AssetError> {
        if id == BLOCK_AIR {
            return Ok(0);
        }
        let def = self.definition(id)?;
        if !def.transparent {
            return Ok(MAX_LIGHT);
        }
        Ok(((def.light_absorption * f32::from(MAX_LIGHT)).floor() as u8).min(MAX_LIGHT))
    }

    /// Resolve the texture for a block face.
    pub fn face_texture(&self, id: BlockId, face: BlockFace) -> Result<&str, AssetError> {
        Ok(self.definition(id)?.textures.texture_for(face))
    }

    /// Tint for a block face: the per-face override, else the base color,
    /// else white.
    pub fn face_color(&self, id: BlockId, face: BlockFace) -> Result<[f32; 3], AssetError> {
        let def = self.definition(id)?;
        Ok(def.face_colors[face.index()]
            .or(def.base_color)
            .unwrap_or([1.0, 1.0, 1.0]))
    }

    /// Whether a block blocks vision/light entirely.
    /// Unregistered ids read as opaque so culling stays conservative.
    pub fn is_opaque(&self, id: BlockId) -> bool {
        match self.get(id) {
            Some(def) => !def.transparent,
            None => {
                self.warn_unknown(id);
                id != BLOCK_AIR
            }
        }
    }

    /// Whether the physics layer should collide with this block.
    pub fn is_collidable(&self, id: BlockId) -> bool {
        self.get(id).map(|def| def.collidable).unwrap_or(false)
    }

    fn warn_unknown(&self, id: BlockId) {
        if !self.unknown_logged.swap(true, Ordering::Relaxed) {
            warn!(block_id = id, "unregistered block id; treating as opaque");
        }
    }
}

impl BlockLightProfile for BlockRegistry {
    fn absorption(&self, id: BlockId) -> u8 {
        match BlockRegistry::absorption(self, id) {
            Ok(value) => value,
            Err(_) => {
                self.warn_unknown(id);
                MAX_LIGHT
            }
        }
    }

    fn emission(&self, id: BlockId) -> [u8; 3] {
        self.get(id).map(|def| def.emissive).unwrap_or([0, 0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin_registry;
    use voxelforge_world::{BLOCK_GLASS, BLOCK_GLOWSTONE, BLOCK_GRASS, BLOCK_LEAVES, BLOCK_STONE};

    #[test]
    fn absorption_mapping() {
        let registry = builtin_registry();
        // Air passes light untouched.
        assert_eq!(registry.absorption(BLOCK_AIR).unwrap(), 0);
        // Opaque blocks absorb everything.
        assert_eq!(registry.absorption(BLOCK_STONE).unwrap(), 15);
        // Leaves declare 0.2 and land on floor(0.2 * 15) = 3.
        assert_eq!(registry.absorption(BLOCK_LEAVES).unwrap(), 3);
        // Glass is free to pass through.
        assert_eq!(registry.absorption(BLOCK_GLASS).unwrap(), 0);
    }

    #[test]
    fn unknown_block_lookup_fails() {
        let registry = builtin_registry();
        assert!(matches!(
            registry.definition(9999),
            Err(AssetError::UnknownBlock(9999))
        ));
        assert!(matches!(
            registry.absorption(9999),
            Err(AssetError::UnknownBlock(9999))
        ));
    }

    #[test]
    fn light_profile_treats_unknown_as_opaque() {
        let registry = builtin_registry();
        let profile: &dyn BlockLightProfile = &registry;
        assert_eq!(profile.absorption(9999), 15);
        assert_eq!(profile.emission(9999), [0, 0, 0]);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = builtin_registry();
        let stone = registry.definition(BLOCK_STONE).unwrap().clone();
        assert!(matches!(
            registry.register(stone),
            Err(AssetError::DuplicateBlock(BLOCK_STONE))
        ));
    }

    #[test]
    fn face_texture_resolution() {
        let registry = builtin_registry();
        // Grass uses the side/top/bottom shape.
        assert_eq!(
            registry.face_texture(BLOCK_GRASS, BlockFace::PosY).unwrap(),
            "grass_top"
        );
        assert_eq!(
            registry.face_texture(BLOCK_GRASS, BlockFace::NegY).unwrap(),
            "dirt"
        );
        assert_eq!(
            registry.face_texture(BLOCK_GRASS, BlockFace::PosX).unwrap(),
            "grass_side"
        );
        // Stone is single-textured on all faces.
        for face in BlockFace::ALL {
            assert_eq!(registry.face_texture(BLOCK_STONE, face).unwrap(), "stone");
        }
    }

    #[test]
    fn emissive_catalog_entry() {
        let registry = builtin_registry();
        let profile: &dyn BlockLightProfile = &registry;
        assert_eq!(profile.emission(BLOCK_GLOWSTONE), [15, 12, 8]);
    }

    #[test]
    fn register_validates_light_fields() {
        let mut registry = BlockRegistry::new();
        let mut def = BlockDefinition {
            id: 500,
            name: "broken".into(),
            category: BlockCategory::Crafted,
            transparent: true,
            collidable: true,
            light_absorption: 1.5,
            emissive: [0, 0, 0],
            textures: BlockTextures::Single("broken".into()),
            base_color: None,
            face_colors: [None; 6],
            side_overlay: None,
            icon: None,
        };
        assert!(matches!(
            registry.register(def.clone()),
            Err(AssetError::InvalidLightAbsorption { .. })
        ));

        def.light_absorption = 0.5;
        def.emissive = [16, 0, 0];
        assert!(matches!(
            registry.register(def),
            Err(AssetError::InvalidEmission { .. })
        ));
    }

    #[test]
    fn face_indices_follow_wire_order() {
        assert_eq!(BlockFace::PosX.index(), 0);
        assert_eq!(BlockFace::NegX.index(), 1);
        assert_eq!(BlockFace::PosY.index(), 2);
        assert_eq!(BlockFace::NegY.index(), 3);
        assert_eq!(BlockFace::PosZ.index(), 4);
        assert_eq!(BlockFace::NegZ.index(), 5);
        assert!(BlockFace::PosX.is_side());
        assert!(!BlockFace::PosY.is_side());
    }
}
