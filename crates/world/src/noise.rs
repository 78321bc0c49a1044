//! Deterministic fractal noise for the terrain and climate fields.
//!
//! Every field the generator samples goes through [`OctaveNoise`]: a stack
//! of Perlin layers where each layer doubles the sample frequency and
//! carries half the weight of the layer before it. A sampler is seeded once
//! and never mutates, so a field value depends only on (seed, position).

use noise::{NoiseFn, Perlin};

/// A fixed stack of Perlin octaves with doubling frequencies and halving
/// weights, normalized so the blended field stays within [-1, 1].
pub struct OctaveNoise {
    perlin: Perlin,
    /// Precomputed (frequency, weight) per octave.
    layers: Vec<(f64, f64)>,
    weight_sum: f64,
}

impl OctaveNoise {
    /// Build a sampler of `octaves` layers starting at `base_frequency`.
    /// At least one layer is always kept.
    pub fn new(seed: u32, octaves: u32, base_frequency: f64) -> Self {
        let count = octaves.max(1) as usize;
        let mut layers = Vec::with_capacity(count);
        for octave in 0..count {
            let scale = (1u64 << octave) as f64;
            layers.push((base_frequency * scale, 1.0 / scale));
        }
        let weight_sum = layers.iter().map(|(_, weight)| weight).sum();
        Self {
            perlin: Perlin::new(seed),
            layers,
            weight_sum,
        }
    }

    /// Blended field value at a world column, in [-1, 1].
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let raw: f64 = self
            .layers
            .iter()
            .map(|&(frequency, weight)| self.perlin.get([x * frequency, z * frequency]) * weight)
            .sum();
        raw / self.weight_sum
    }

    /// Field value folded onto the unit interval [0, 1].
    pub fn unit_sample(&self, x: f64, z: f64) -> f64 {
        self.sample(x, z) * 0.5 + 0.5
    }
}
