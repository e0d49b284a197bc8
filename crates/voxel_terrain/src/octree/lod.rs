//! LodRanges - distance bands that pick the target LOD for a node.

use crate::config::ChunkConfig;

/// Smallest band spacing, in node diagonals, that keeps adjacent leaves
/// within one LOD of each other.
pub const MIN_LOD_SPACING: f32 = 2.0;

/// Default band spacing in node diagonals.
pub const DEFAULT_LOD_SPACING: f32 = 2.0;

/// Upper distance bound, in world units, for each LOD.
///
/// Bands are floor-enforced: `band[i] >= band[i - 1] + spacing * diagonal(i)`
/// where `diagonal(i)` is the world-space diagonal of a node at LOD `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct LodRanges {
  bands: Vec<f32>,
  spacing: f32,
}

impl LodRanges {
  /// Tightest bands allowed for `config`.
  pub fn new(config: &ChunkConfig) -> Self {
    Self::from_bands(config, &[], DEFAULT_LOD_SPACING)
  }

  /// Bands from requested values, raised to the floor where needed.
  ///
  /// Missing entries default to the floor; extra entries are ignored.
  pub fn from_bands(config: &ChunkConfig, requested: &[f32], spacing: f32) -> Self {
    let spacing = spacing.max(MIN_LOD_SPACING);
    let lods = config.levels_of_detail() as usize;
    let mut bands = Vec::with_capacity(lods);
    let mut previous = 0.0f32;
    for lod in 0..lods {
      let floor = previous + spacing * node_diagonal(config, lod as u8);
      let band = requested.get(lod).copied().unwrap_or(0.0).max(floor);
      bands.push(band);
      previous = band;
    }
    Self { bands, spacing }
  }

  /// Same bands with a different spacing, re-floored.
  pub fn with_spacing(self, config: &ChunkConfig, spacing: f32) -> Self {
    Self::from_bands(config, &self.bands, spacing)
  }

  #[inline]
  pub fn bands(&self) -> &[f32] {
    &self.bands
  }

  #[inline]
  pub fn spacing(&self) -> f32 {
    self.spacing
  }

  /// First LOD whose band reaches `distance`, else the coarsest.
  pub fn target_lod(&self, distance: f32) -> u8 {
    self
      .bands
      .iter()
      .position(|&band| band >= distance)
      .unwrap_or(self.bands.len().saturating_sub(1)) as u8
  }
}

/// World-space diagonal of a node at `lod`.
#[inline]
pub fn node_diagonal(config: &ChunkConfig, lod: u8) -> f32 {
  config.node_size(lod) as f32 * config.resolution() * 3f32.sqrt()
}

#[cfg(test)]
#[path = "lod_test.rs"]
mod lod_test;
