//! voxelforge - headless driver for the world-simulation core.
//!
//! Generates, lights and meshes the chunks around a fixed observer, then
//! prints a pipeline summary. The renderer, input and audio shells consume
//! the same orchestrator through its event bus and query traits.

use std::env;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use glam::Vec3;
use tracing::info;

use voxelforge::{install_registry, EngineConfig, WorldEvent, WorldOrchestrator};
use voxelforge_assets::builtin_registry;

fn main() -> Result<()> {
    // WARN by default; override via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting voxelforge v{}", env!("CARGO_PKG_VERSION"));

    let frames: u32 = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(600);

    let config = EngineConfig::load();
    let registry = install_registry(builtin_registry());
    let mut world = WorldOrchestrator::new(config, registry);

    let observer = Vec3::new(8.0, 80.0, 8.0);
    world.update_observer(observer);

    let mut generated = 0usize;
    let mut lit = 0usize;
    let mut meshed = 0usize;
    let mut total_quads = 0usize;

    for frame in 0..frames {
        world.pump();
        for event in world.events().drain() {
            match event {
                WorldEvent::ChunkGenerated { .. } => generated += 1,
                WorldEvent::LightingCalculated { .. } => lit += 1,
                WorldEvent::ChunkMeshBuilt { mesh, .. } => {
                    meshed += 1;
                    total_quads += mesh.quad_count();
                }
                _ => {}
            }
        }
        if frame > 0 && !world.is_busy() {
            info!(frame, "pipeline settled");
            break;
        }
        thread::sleep(Duration::from_millis(16));
    }

    info!(
        chunks = world.loaded_chunk_count(),
        generated, lit, meshed, total_quads, "headless run complete"
    );
    println!(
        "voxelforge: {} chunks resident, {} generated, {} lit, {} meshed, {} quads",
        world.loaded_chunk_count(),
        generated,
        lit,
        meshed,
        total_quads
    );
    Ok(())
}
