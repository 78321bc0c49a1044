//! Built-in block catalog and JSON pack loading.

use voxelforge_world::{
    BLOCK_AIR, BLOCK_BEDROCK, BLOCK_DIRT, BLOCK_GLASS, BLOCK_GLOWSTONE, BLOCK_GRASS,
    BLOCK_LEAVES, BLOCK_LOG, BLOCK_ROCK, BLOCK_SAND, BLOCK_SNOW, BLOCK_STONE, BLOCK_WATER,
};

use crate::registry::{
    BlockCategory, BlockDefinition, BlockRegistry, BlockTextures, SideOverlay,
};
use crate::AssetError;

fn simple(
    id: u16,
    name: &str,
    category: BlockCategory,
    texture: &str,
    base_color: [f32; 3],
) -> BlockDefinition {
    BlockDefinition {
        id,
        name: name.to_string(),
        category,
        transparent: false,
        collidable: true,
        light_absorption: 0.0,
        emissive: [0, 0, 0],
        textures: BlockTextures::Single(texture.to_string()),
        base_color: Some(base_color),
        face_colors: [None; 6],
        side_overlay: None,
        icon: None,
    }
}

/// The block set the terrain generator and tests rely on.
pub fn builtin_registry() -> BlockRegistry {
    let defs = vec![
        BlockDefinition {
            id: BLOCK_AIR,
            name: "air".into(),
            category: BlockCategory::Natural,
            transparent: true,
            collidable: false,
            light_absorption: 0.0,
            emissive: [0, 0, 0],
            textures: BlockTextures::Single("air".into()),
            base_color: None,
            face_colors: [None; 6],
            side_overlay: None,
            icon: None,
        },
        simple(BLOCK_STONE, "stone", BlockCategory::Natural, "stone", [0.55, 0.55, 0.58]),
        simple(BLOCK_DIRT, "dirt", BlockCategory::Natural, "dirt", [0.45, 0.32, 0.22]),
        BlockDefinition {
            id: BLOCK_GRASS,
            name: "grass".into(),
            category: BlockCategory::Natural,
            transparent: false,
            collidable: true,
            light_absorption: 0.0,
            emissive: [0, 0, 0],
            textures: BlockTextures::SideTopBottom {
                side: "grass_side".into(),
                top: "grass_top".into(),
                bottom: "dirt".into(),
            },
            base_color: Some([0.45, 0.32, 0.22]),
            face_colors: {
                let mut colors = [None; 6];
                colors[2] = Some([0.36, 0.62, 0.26]); // +Y carries the turf tint
                colors
            },
            side_overlay: Some(SideOverlay {
                color: [0.36, 0.62, 0.26],
                height: 0.25,
            }),
            icon: Some("grass_icon".into()),
        },
        simple(BLOCK_SAND, "sand", BlockCategory::Natural, "sand", [0.87, 0.82, 0.64]),
        simple(BLOCK_BEDROCK, "bedrock", BlockCategory::Natural, "bedrock", [0.20, 0.20, 0.22]),
        BlockDefinition {
            id: BLOCK_WATER,
            name: "water".into(),
            category: BlockCategory::Liquid,
            transparent: true,
            collidable: false,
            light_absorption: 0.15,
            emissive: [0, 0, 0],
            textures: BlockTextures::Single("water".into()),
            base_color: Some([0.25, 0.40, 0.80]),
            face_colors: [None; 6],
            side_overlay: None,
            icon: None,
        },
        BlockDefinition {
            id: BLOCK_LOG,
            name: "log".into(),
            category: BlockCategory::Vegetation,
            transparent: false,
            collidable: true,
            light_absorption: 0.0,
            emissive: [0, 0, 0],
            textures: BlockTextures::SideTopBottom {
                side: "log_side".into(),
                top: "log_top".into(),
                bottom: "log_top".into(),
            },
            base_color: Some([0.42, 0.32, 0.20]),
            face_colors: [None; 6],
            side_overlay: None,
            icon: None,
        },
        BlockDefinition {
            id: BLOCK_LEAVES,
            name: "leaves".into(),
            category: BlockCategory::Vegetation,
            transparent: true,
            collidable: true,
            light_absorption: 0.2,
            emissive: [0, 0, 0],
            textures: BlockTextures::Single("leaves".into()),
            base_color: Some([0.30, 0.55, 0.25]),
            face_colors: [None; 6],
            side_overlay: None,
            icon: None,
        },
        BlockDefinition {
            id: BLOCK_GLASS,
            name: "glass".into(),
            category: BlockCategory::Crafted,
            transparent: true,
            collidable: true,
            light_absorption: 0.0,
            emissive: [0, 0, 0],
            textures: BlockTextures::Single("glass".into()),
            base_color: Some([0.90, 0.95, 1.00]),
            face_colors: [None; 6],
            side_overlay: None,
            icon: None,
        },
        BlockDefinition {
            id: BLOCK_GLOWSTONE,
            name: "glowstone".into(),
            category: BlockCategory::Crafted,
            transparent: false,
            collidable: true,
            light_absorption: 0.0,
            emissive: [15, 12, 8],
            textures: BlockTextures::Single("glowstone".into()),
            base_color: Some([1.00, 0.90, 0.60]),
            face_colors: [None; 6],
            side_overlay: None,
            icon: None,
        },
        simple(BLOCK_ROCK, "rock", BlockCategory::Natural, "rock", [0.48, 0.47, 0.46]),
        simple(BLOCK_SNOW, "snow", BlockCategory::Natural, "snow", [0.95, 0.96, 1.00]),
    ];

    BlockRegistry::from_definitions(defs).expect("builtin catalog is well-formed")
}

/// Parse block definitions from a JSON array (content pack shape).
pub fn load_definitions(json: &str) -> Result<Vec<BlockDefinition>, AssetError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockFace;

    #[test]
    fn builtin_covers_terrain_blocks() {
        let registry = builtin_registry();
        for id in [
            BLOCK_AIR,
            BLOCK_STONE,
            BLOCK_DIRT,
            BLOCK_GRASS,
            BLOCK_SAND,
            BLOCK_BEDROCK,
            BLOCK_WATER,
            BLOCK_LOG,
            BLOCK_LEAVES,
            BLOCK_GLASS,
            BLOCK_GLOWSTONE,
            BLOCK_ROCK,
            BLOCK_SNOW,
        ] {
            assert!(registry.get(id).is_some(), "block {id} missing from catalog");
        }
    }

    #[test]
    fn grass_declares_a_side_overlay() {
        let registry = builtin_registry();
        let grass = registry.definition(BLOCK_GRASS).unwrap();
        let overlay = grass.side_overlay.expect("grass has a fringe overlay");
        assert!(overlay.height > 0.0 && overlay.height < 1.0);
        // The +Y override wins over the base color.
        let top = registry.face_color(BLOCK_GRASS, BlockFace::PosY).unwrap();
        let side = registry.face_color(BLOCK_GRASS, BlockFace::PosX).unwrap();
        assert_ne!(top, side);
    }

    #[test]
    fn load_definitions_round_trips() {
        let json = r#"[
            {
                "id": 200,
                "name": "lamp",
                "category": "crafted",
                "emissive": [14, 14, 10],
                "textures": "lamp"
            },
            {
                "id": 201,
                "name": "tinted_glass",
                "category": "crafted",
                "transparent": true,
                "light_absorption": 0.4,
                "textures": { "side": "tint_side", "top": "tint_top", "bottom": "tint_top" }
            }
        ]"#;
        let defs = load_definitions(json).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].emissive, [14, 14, 10]);
        assert!(defs[1].transparent);

        let registry = BlockRegistry::from_definitions(defs).unwrap();
        assert_eq!(registry.absorption(201).unwrap(), 6);
        assert_eq!(
            registry.face_texture(201, BlockFace::PosY).unwrap(),
            "tint_top"
        );
    }

    #[test]
    fn malformed_pack_is_a_parse_error() {
        assert!(matches!(
            load_definitions("not json"),
            Err(AssetError::Parse(_))
        ));
    }
}
