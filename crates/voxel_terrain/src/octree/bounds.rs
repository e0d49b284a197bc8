//! Integer axis-aligned voxel bounds.

use glam::IVec3;

/// Inclusive voxel-space bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelBounds {
  /// Minimum corner (inclusive).
  pub min: IVec3,
  /// Maximum corner (inclusive).
  pub max: IVec3,
}

impl VoxelBounds {
  pub fn new(min: IVec3, max: IVec3) -> Self {
    debug_assert!(min.cmple(max).all(), "bounds min must be <= max on all axes");
    Self { min, max }
  }

  /// A single voxel.
  #[inline]
  pub fn from_point(point: IVec3) -> Self {
    Self {
      min: point,
      max: point,
    }
  }

  /// Cube starting at `min` spanning `size` voxels, both ends included.
  #[inline]
  pub fn from_origin_size(min: IVec3, size: i32) -> Self {
    Self {
      min,
      max: min + IVec3::splat(size),
    }
  }

  #[inline]
  pub fn union(&self, other: &VoxelBounds) -> VoxelBounds {
    Self {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  #[inline]
  pub fn include(&mut self, point: IVec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Grow by `by` voxels on every side.
  #[inline]
  pub fn expand(&self, by: i32) -> VoxelBounds {
    Self {
      min: self.min - IVec3::splat(by),
      max: self.max + IVec3::splat(by),
    }
  }

  /// Shared voxels, boundaries included.
  #[inline]
  pub fn intersects(&self, other: &VoxelBounds) -> bool {
    self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
  }

  #[inline]
  pub fn contains(&self, point: IVec3) -> bool {
    self.min.cmple(point).all() && self.max.cmpge(point).all()
  }

  /// Voxels per axis.
  #[inline]
  pub fn size(&self) -> IVec3 {
    self.max - self.min + IVec3::ONE
  }
}

#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;
