//! Pinned voxel rules.
//!
//! Overrides force voxels to fixed values when a chunk is first filled and
//! protect them from later edits. Plane rules pin a whole axis-aligned slice
//! of the padded chunk; point rules pin a single voxel. Both use chunk-local
//! voxel coordinates (`-1..=chunk_size + 1`).

use std::collections::HashMap;

use glam::IVec3;

use super::VoxelBuffer;
use crate::config::ChunkConfig;
use crate::types::VoxelData;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
  X,
  Y,
  Z,
}

impl Axis {
  #[inline]
  pub fn index(self) -> usize {
    match self {
      Axis::X => 0,
      Axis::Y => 1,
      Axis::Z => 2,
    }
  }
}

/// Pins every voxel whose `axis` coordinate equals `slice`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneRule {
  pub axis: Axis,
  pub slice: i32,
  pub voxel: VoxelData,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoxelOverrides {
  planes: Vec<PlaneRule>,
  points: HashMap<IVec3, VoxelData>,
}

impl VoxelOverrides {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_plane(mut self, axis: Axis, slice: i32, voxel: VoxelData) -> Self {
    self.add_plane(axis, slice, voxel);
    self
  }

  pub fn with_point(mut self, local: IVec3, voxel: VoxelData) -> Self {
    self.add_point(local, voxel);
    self
  }

  pub fn add_plane(&mut self, axis: Axis, slice: i32, voxel: VoxelData) {
    self.planes.push(PlaneRule { axis, slice, voxel });
  }

  pub fn add_point(&mut self, local: IVec3, voxel: VoxelData) {
    self.points.insert(local, voxel);
  }

  pub fn is_empty(&self) -> bool {
    self.planes.is_empty() && self.points.is_empty()
  }

  pub fn planes(&self) -> &[PlaneRule] {
    &self.planes
  }

  /// Pinned value at a chunk-local position. Point rules win over planes.
  pub fn rule_at(&self, local: IVec3) -> Option<VoxelData> {
    if let Some(voxel) = self.points.get(&local) {
      return Some(*voxel);
    }
    self
      .planes
      .iter()
      .rev()
      .find(|rule| local[rule.axis.index()] == rule.slice)
      .map(|rule| rule.voxel)
  }

  #[inline]
  pub fn is_pinned(&self, local: IVec3) -> bool {
    self.rule_at(local).is_some()
  }

  /// Write every rule into `buffer`. Returns the number of voxels written.
  pub fn apply(&self, buffer: &mut VoxelBuffer, config: &ChunkConfig) -> usize {
    let lo = -1;
    let hi = config.chunk_size() as i32 + 1;
    let mut written = 0;

    for rule in &self.planes {
      if rule.slice < lo || rule.slice > hi {
        continue;
      }
      let axis = rule.axis.index();
      let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
      for a in lo..=hi {
        for b in lo..=hi {
          let mut local = IVec3::ZERO;
          local[axis] = rule.slice;
          local[u] = a;
          local[v] = b;
          if let Some(index) = config.voxel_index(local) {
            buffer.set(index, rule.voxel);
            written += 1;
          }
        }
      }
    }

    for (&local, &voxel) in &self.points {
      if let Some(index) = config.voxel_index(local) {
        buffer.set(index, voxel);
        written += 1;
      }
    }
    written
  }
}

#[cfg(test)]
#[path = "overrides_test.rs"]
mod overrides_test;
