//! Core data types shared by storage, extraction and editing.

use std::ops::Range;

/// Material identifier stored per voxel.
pub type MaterialId = u8;

/// One voxel sample: density plus material.
///
/// Density at or above the chunk's threshold is solid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VoxelData {
  pub density: u8,
  pub material: MaterialId,
}

impl VoxelData {
  /// Fully empty voxel (density 0, material 0).
  pub const AIR: Self = Self {
    density: 0,
    material: 0,
  };

  #[inline]
  pub const fn new(density: u8, material: MaterialId) -> Self {
    Self { density, material }
  }
}

/// A local, already-resolved voxel mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelEdit {
  /// Linear data index inside the chunk's padded buffer.
  pub index: usize,
  pub density: u8,
  pub material: MaterialId,
}

impl VoxelEdit {
  #[inline]
  pub fn voxel(&self) -> VoxelData {
    VoxelData::new(self.density, self.material)
  }
}

/// Output vertex produced by surface extraction.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
  /// Chunk-local position in world units.
  pub position: [f32; 3],

  /// Unit normal pointing away from solid.
  pub normal: [f32; 3],

  /// Primary and secondary material.
  pub materials: [MaterialId; 2],

  /// Weight of the secondary material in `[0, 1]`.
  pub blend: f32,
}

impl MeshVertex {
  /// Material blend packed into one channel: primary in bits 0-7, secondary
  /// in bits 8-15, quantized blend weight in bits 16-23.
  #[inline]
  pub fn packed_material(&self) -> u32 {
    let weight = (self.blend.clamp(0.0, 1.0) * 255.0).round() as u32;
    u32::from(self.materials[0]) | (u32::from(self.materials[1]) << 8) | (weight << 16)
  }
}

impl Default for MeshVertex {
  fn default() -> Self {
    Self {
      position: [0.0; 3],
      normal: [0.0, 1.0, 0.0],
      materials: [0; 2],
      blend: 0.0,
    }
  }
}

/// Regular-cell extraction result.
#[derive(Clone, Debug, Default)]
pub struct MeshOutput {
  pub vertices: Vec<MeshVertex>,

  /// Triangle indices (3 per triangle).
  pub indices: Vec<u32>,
}

impl MeshOutput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clear all buffers, preserving capacity.
  pub fn clear(&mut self) {
    self.vertices.clear();
    self.indices.clear();
  }

  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }
}

/// Transition-cell extraction result for all six faces of a leaf.
///
/// `face_ranges[f]` is the contiguous slice of `indices` produced for face
/// `f` (see [`crate::octree::Face`]).
#[derive(Clone, Debug, Default)]
pub struct TransitionMeshOutput {
  pub vertices: Vec<MeshVertex>,
  pub indices: Vec<u32>,
  pub face_ranges: [Range<usize>; 6],
}

impl TransitionMeshOutput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  /// Triangle indices of one face.
  pub fn face_indices(&self, face: usize) -> &[u32] {
    &self.indices[self.face_ranges[face].clone()]
  }

  /// Indices of every face whose bit is set in `mask`.
  pub fn filtered_indices(&self, mask: u8) -> Vec<u32> {
    let mut out = Vec::new();
    for face in 0..6 {
      if mask & (1 << face) != 0 {
        out.extend_from_slice(self.face_indices(face));
      }
    }
    out
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
