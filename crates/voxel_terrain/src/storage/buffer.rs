//! Dense padded voxel buffer.

use glam::IVec3;

use crate::config::ChunkConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::types::VoxelData;

/// Dense, contiguous voxel samples for one chunk including its skirt.
///
/// Addressed with [`ChunkConfig::data_index`] / [`ChunkConfig::voxel_index`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelBuffer {
  voxels: Vec<VoxelData>,
  width: usize,
}

impl VoxelBuffer {
  /// Allocate an all-air buffer sized for `config`.
  pub fn new(config: &ChunkConfig) -> Self {
    Self {
      voxels: vec![VoxelData::AIR; config.data_volume_size() as usize],
      width: config.data_width_size() as usize,
    }
  }

  /// Wrap existing samples, checking the length against `config`.
  pub fn from_voxels(config: &ChunkConfig, voxels: Vec<VoxelData>) -> TerrainResult<Self> {
    let expected = config.data_volume_size() as usize;
    if voxels.len() != expected {
      return Err(TerrainError::BufferSizeMismatch {
        expected,
        actual: voxels.len(),
      });
    }
    Ok(Self {
      voxels,
      width: config.data_width_size() as usize,
    })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.voxels.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.voxels.is_empty()
  }

  /// Samples per axis (`chunk_size + 3`).
  #[inline]
  pub fn width(&self) -> usize {
    self.width
  }

  #[inline]
  pub fn as_slice(&self) -> &[VoxelData] {
    &self.voxels
  }

  #[inline]
  pub fn as_mut_slice(&mut self) -> &mut [VoxelData] {
    &mut self.voxels
  }

  #[inline]
  pub fn get(&self, index: usize) -> VoxelData {
    self.voxels[index]
  }

  #[inline]
  pub fn set(&mut self, index: usize, voxel: VoxelData) {
    self.voxels[index] = voxel;
  }

  pub fn fill(&mut self, voxel: VoxelData) {
    self.voxels.fill(voxel);
  }

  /// Sample at a chunk-local voxel position, clamped into the padded range.
  #[inline]
  pub fn sample(&self, local: IVec3) -> VoxelData {
    let max = self.width as i32 - 1;
    let d = (local + IVec3::ONE).clamp(IVec3::ZERO, IVec3::splat(max));
    let w = self.width;
    self.voxels[d.x as usize + d.y as usize * w + d.z as usize * w * w]
  }

  #[inline]
  pub fn density(&self, local: IVec3) -> u8 {
    self.sample(local).density
  }

  /// Fill every sample from a closure over chunk-local voxel positions.
  pub fn fill_with(&mut self, mut f: impl FnMut(IVec3) -> VoxelData) {
    let w = self.width;
    for (index, voxel) in self.voxels.iter_mut().enumerate() {
      let local = IVec3::new(
        (index % w) as i32,
        ((index / w) % w) as i32,
        (index / (w * w)) as i32,
      ) - IVec3::ONE;
      *voxel = f(local);
    }
  }
}
