//! Content and override sources - the data-production contract.
//!
//! A [`ContentSource`] fills a chunk's padded dense buffer on first
//! initialization. An [`OverrideSource`] decides which voxels of a chunk are
//! pinned; pinned voxels are written over the content and never edited.

use glam::IVec3;

use crate::config::ChunkConfig;
use crate::storage::{Axis, VoxelBuffer, VoxelOverrides};
use crate::types::VoxelData;

/// Produces initial voxel data for a chunk.
pub trait ContentSource: Send + Sync {
  /// Fill every voxel of `out`, skirt included (`-1..=chunk_size + 1`).
  fn fill_data_array(&self, chunk: IVec3, config: &ChunkConfig, out: &mut VoxelBuffer);
}

/// Produces the pinned voxel rules of a chunk.
pub trait OverrideSource: Send + Sync {
  fn build_chunk_overrides(&self, chunk: IVec3, config: &ChunkConfig) -> VoxelOverrides;
}

/// Pins nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOverrides;

impl OverrideSource for NoOverrides {
  fn build_chunk_overrides(&self, _chunk: IVec3, _config: &ChunkConfig) -> VoxelOverrides {
    VoxelOverrides::new()
  }
}

/// Pins the outer faces of an inclusive chunk range to air so the volume is
/// closed.
///
/// ```text
///   chunk on the min face of an axis: local slices -1 and 0 pinned
///   chunk on the max face of an axis: local slices cs and cs + 1 pinned
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SealedBoundsOverrides {
  min: IVec3,
  max: IVec3,
}

impl SealedBoundsOverrides {
  /// Seal the chunks `min..=max`.
  pub fn new(min: IVec3, max: IVec3) -> Self {
    Self {
      min: min.min(max),
      max: min.max(max),
    }
  }
}

impl OverrideSource for SealedBoundsOverrides {
  fn build_chunk_overrides(&self, chunk: IVec3, config: &ChunkConfig) -> VoxelOverrides {
    let cs = config.chunk_size() as i32;
    let mut overrides = VoxelOverrides::new();
    for axis in [Axis::X, Axis::Y, Axis::Z] {
      let i = axis.index();
      if chunk[i] == self.min[i] {
        overrides.add_plane(axis, -1, VoxelData::AIR);
        overrides.add_plane(axis, 0, VoxelData::AIR);
      }
      if chunk[i] == self.max[i] {
        overrides.add_plane(axis, cs, VoxelData::AIR);
        overrides.add_plane(axis, cs + 1, VoxelData::AIR);
      }
    }
    overrides
  }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod source_test;
