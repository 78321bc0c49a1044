//! Property-based tests for the packed voxel word layout.
//!
//! For any (id, sky, r, g, b) in range, setting then getting returns the
//! same values and leaves unrelated channels untouched, and the wire
//! round-trip is byte-identical.

use proptest::prelude::*;
use voxelforge_world::{ChunkData, ChunkPos, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};

proptest! {
    #[test]
    fn packing_round_trip(
        x in 0..CHUNK_SIZE_X as i32,
        y in 0..CHUNK_SIZE_Y as i32,
        z in 0..CHUNK_SIZE_Z as i32,
        id in 0u16..=0xFFFF,
        sky in 0u8..=15,
        r in 0u8..=15,
        g in 0u8..=15,
        b in 0u8..=15,
    ) {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        chunk.set_block(x, y, z, id);
        chunk.set_sky(x, y, z, sky);
        chunk.set_block_light(x, y, z, r, g, b);

        prop_assert_eq!(chunk.get_block(x, y, z), id);
        prop_assert_eq!(chunk.get_sky(x, y, z), sky);
        prop_assert_eq!(chunk.get_block_light(x, y, z), [r, g, b]);
    }

    #[test]
    fn unrelated_channels_survive_rewrites(
        x in 0..CHUNK_SIZE_X as i32,
        y in 0..CHUNK_SIZE_Y as i32,
        z in 0..CHUNK_SIZE_Z as i32,
        id in 0u16..=0xFFFF,
        sky in 0u8..=15,
        rgb in [0u8..=15, 0u8..=15, 0u8..=15],
        new_id in 0u16..=0xFFFF,
        new_sky in 0u8..=15,
    ) {
        let mut chunk = ChunkData::new(ChunkPos::new(0, 0));
        chunk.set_block(x, y, z, id);
        chunk.set_sky(x, y, z, sky);
        chunk.set_block_light(x, y, z, rgb[0], rgb[1], rgb[2]);

        // Rewriting the block id preserves light.
        chunk.set_block(x, y, z, new_id);
        prop_assert_eq!(chunk.get_sky(x, y, z), sky);
        prop_assert_eq!(chunk.get_block_light(x, y, z), rgb);

        // Rewriting sky preserves id and colored light.
        chunk.set_sky(x, y, z, new_sky);
        prop_assert_eq!(chunk.get_block(x, y, z), new_id);
        prop_assert_eq!(chunk.get_block_light(x, y, z), rgb);
    }

    #[test]
    fn wire_round_trip_is_lossless(
        cells in proptest::collection::vec(
            (
                0..CHUNK_SIZE_X as i32,
                0..CHUNK_SIZE_Y as i32,
                0..CHUNK_SIZE_Z as i32,
                any::<u16>(),
                0u8..=15,
            ),
            0..64,
        ),
    ) {
        let mut chunk = ChunkData::new(ChunkPos::new(3, -9));
        for (x, y, z, id, light) in cells {
            chunk.set_block(x, y, z, id);
            chunk.set_sky(x, y, z, light);
            chunk.set_block_light(x, y, z, light, light / 2, 15 - light);
        }

        let bytes = chunk.to_bytes();
        let restored = ChunkData::from_bytes(chunk.position(), &bytes).unwrap();
        prop_assert_eq!(restored.words(), chunk.words());
    }
}
