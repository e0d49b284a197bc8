//! Simple analytic content sources for testing and debugging.
//!
//! These sources produce deterministic shapes that are easy to verify, so
//! chunk tiling, seams and edits can be checked without a noise generator.
//! Shapes are defined in global voxel space.

use glam::{IVec3, Vec3};

use crate::config::ChunkConfig;
use crate::source::ContentSource;
use crate::storage::VoxelBuffer;
use crate::types::{MaterialId, VoxelData};

/// Density change per voxel of signed distance.
pub const DENSITY_PER_VOXEL: f32 = 32.0;

/// Density for a signed distance in voxels, positive inside.
///
/// Zero distance lands exactly on the default threshold.
#[inline]
pub fn density_from_distance(inside: f32) -> u8 {
  (128.0 + inside * DENSITY_PER_VOXEL).round().clamp(0.0, 255.0) as u8
}

fn fill_global(chunk: IVec3, config: &ChunkConfig, out: &mut VoxelBuffer, f: impl Fn(Vec3) -> VoxelData) {
  let origin = config.chunk_origin(chunk);
  out.fill_with(|local| f((origin + local).as_vec3()));
}

/// The same voxel everywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSource(pub VoxelData);

impl ContentSource for UniformSource {
  fn fill_data_array(&self, _chunk: IVec3, _config: &ChunkConfig, out: &mut VoxelBuffer) {
    out.fill(self.0);
  }
}

/// Solid below a horizontal plane.
///
/// Surface sits at global voxel `y = height`.
#[derive(Clone, Copy, Debug)]
pub struct HeightPlaneSource {
  pub height: f32,
  pub material: MaterialId,
}

impl HeightPlaneSource {
  pub fn new(height: f32) -> Self {
    Self { height, material: 1 }
  }

  pub fn with_material(mut self, material: MaterialId) -> Self {
    self.material = material;
    self
  }
}

impl ContentSource for HeightPlaneSource {
  fn fill_data_array(&self, chunk: IVec3, config: &ChunkConfig, out: &mut VoxelBuffer) {
    fill_global(chunk, config, out, |p| {
      VoxelData::new(density_from_distance(self.height - p.y), self.material)
    });
  }
}

/// Solid ball.
#[derive(Clone, Copy, Debug)]
pub struct SphereSource {
  /// Centre in global voxel space.
  pub center: Vec3,
  pub radius: f32,
  pub material: MaterialId,
}

impl SphereSource {
  pub fn new(center: Vec3, radius: f32) -> Self {
    Self {
      center,
      radius,
      material: 1,
    }
  }

  pub fn with_material(mut self, material: MaterialId) -> Self {
    self.material = material;
    self
  }
}

impl ContentSource for SphereSource {
  fn fill_data_array(&self, chunk: IVec3, config: &ChunkConfig, out: &mut VoxelBuffer) {
    fill_global(chunk, config, out, |p| {
      let inside = self.radius - p.distance(self.center);
      VoxelData::new(density_from_distance(inside), self.material)
    });
  }
}

#[cfg(test)]
#[path = "samplers_test.rs"]
mod samplers_test;
