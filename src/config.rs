//! Engine configuration.
//!
//! Chunk dimensions are compile-time constants in `voxelforge-world`
//! (the packed word addressing depends on them); everything tunable at
//! startup lives here and loads from TOML, falling back to defaults with a
//! warning on any read or parse error.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use voxelforge_world::DEFAULT_LIGHT_QUEUE_CAP;

const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunk radius loaded around the observer.
    pub render_radius: i32,
    /// Terrain generation worker threads.
    pub terrain_workers: usize,
    /// Lighting worker threads.
    pub lighting_workers: usize,
    /// Meshing worker threads.
    pub meshing_workers: usize,
    /// Wall-clock budget per frame for dispatching dirty mesh rebuilds.
    pub rebuild_budget_ms: f64,
    /// Interval between unload sweeps.
    pub chunk_unload_interval_ms: u64,
    /// Flood queue capacity per lighting task.
    pub light_queue_cap: usize,
    /// Event bus capacity; events beyond it are dropped with a warning.
    pub event_capacity: usize,
    /// World seed.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_radius: 3,
            terrain_workers: 1,
            lighting_workers: 6,
            meshing_workers: 6,
            rebuild_budget_ms: 3.0,
            chunk_unload_interval_ms: 5000,
            light_queue_cap: DEFAULT_LIGHT_QUEUE_CAP,
            event_capacity: 1024,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<EngineConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    EngineConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                EngineConfig::default()
            }
        }
    }

    /// Dirty-queue dispatch budget as a duration.
    pub fn rebuild_budget(&self) -> Duration {
        Duration::from_secs_f64(self.rebuild_budget_ms / 1000.0)
    }

    /// Unload sweep interval as a duration.
    pub fn unload_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_unload_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.render_radius, 3);
        assert_eq!(config.lighting_workers, 6);
        assert_eq!(config.meshing_workers, 6);
        assert_eq!(config.rebuild_budget_ms, 3.0);
        assert_eq!(config.chunk_unload_interval_ms, 5000);
        assert_eq!(config.light_queue_cap, DEFAULT_LIGHT_QUEUE_CAP);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: EngineConfig = toml::from_str("render_radius = 7\nseed = 42").unwrap();
        assert_eq!(config.render_radius, 7);
        assert_eq!(config.seed, 42);
        assert_eq!(config.lighting_workers, 6);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load_from_path(Path::new("definitely/not/here.toml"));
        assert_eq!(config.render_radius, EngineConfig::default().render_radius);
    }

    #[test]
    fn budget_conversion() {
        let config = EngineConfig::default();
        assert_eq!(config.rebuild_budget(), Duration::from_micros(3000));
        assert_eq!(config.unload_interval(), Duration::from_secs(5));
    }
}
