//! Shared chunk geometry configuration.
//!
//! # Data Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       PADDED CHUNK DATA (one axis)                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Data index:    0     1     2    ...   cs    cs+1  cs+2                 │
//! │  Voxel local:  -1     0     1    ...   cs-1  cs    cs+1                 │
//! │                 │     └──── chunk voxels ────┘│     │                   │
//! │                 │                             │     └─ gradient skirt   │
//! │                 └─ negative skirt             └─ last cube corner       │
//! │                                                                         │
//! │  data_width_size = chunk_size + 3                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cubes of a chunk span voxels `[0, chunk_size]`; the skirt on both sides
//! lets central differences at every cube corner stay inside the buffer.
//!
//! # 3D Indexing
//!
//! ```text
//! index = x + y * width + z * width²      (data coordinates, X fastest)
//! ```
//!
//! A "deck" is one `width²` slab of constant Z; decks are the unit of
//! parallel pack/unpack work.

use glam::{IVec3, Vec3};

use crate::error::{TerrainError, TerrainResult};

/// Default chunk edge length in voxels.
pub const DEFAULT_CHUNK_SIZE: u32 = 32;

/// Default number of octree LOD levels per chunk.
pub const DEFAULT_LEVELS_OF_DETAIL: u8 = 3;

/// Default density threshold separating solid from empty.
pub const DEFAULT_DENSITY_THRESHOLD: u8 = 128;

/// Immutable geometry parameters shared by every chunk of a volume.
///
/// Created once per volume and shared through `Arc<ChunkConfig>`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkConfig {
  chunk_size: u32,
  data_width_size: u32,
  data_area_size: u32,
  data_volume_size: u32,
  cubes_per_octree_leaf: u32,
  levels_of_detail: u8,
  density_threshold: u8,
  resolution: f32,
  offset: IVec3,
}

impl ChunkConfig {
  /// Create a config for `chunk_size`³ chunks with `levels_of_detail` octree
  /// levels. The root node (LOD `levels_of_detail - 1`) covers the chunk.
  pub fn new(chunk_size: u32, levels_of_detail: u8) -> TerrainResult<Self> {
    if chunk_size < 2 || !chunk_size.is_power_of_two() {
      return Err(TerrainError::InvalidConfig(format!(
        "chunk size {chunk_size} must be a power of two >= 2"
      )));
    }
    if levels_of_detail == 0 {
      return Err(TerrainError::InvalidConfig(
        "at least one level of detail is required".into(),
      ));
    }
    let root_lod = u32::from(levels_of_detail - 1);
    if root_lod > chunk_size.trailing_zeros() {
      return Err(TerrainError::InvalidConfig(format!(
        "{levels_of_detail} levels of detail do not fit a chunk of size {chunk_size}"
      )));
    }

    let width = chunk_size + 3;
    Ok(Self {
      chunk_size,
      data_width_size: width,
      data_area_size: width * width,
      data_volume_size: width * width * width,
      cubes_per_octree_leaf: chunk_size >> root_lod,
      levels_of_detail,
      density_threshold: DEFAULT_DENSITY_THRESHOLD,
      resolution: 1.0,
      offset: IVec3::ZERO,
    })
  }

  pub fn with_density_threshold(mut self, threshold: u8) -> Self {
    self.density_threshold = threshold;
    self
  }

  /// World units per voxel. Non-positive values are ignored.
  pub fn with_resolution(mut self, resolution: f32) -> Self {
    if resolution > 0.0 {
      self.resolution = resolution;
    }
    self
  }

  /// Integer voxel-space offset applied when converting to world space.
  pub fn with_offset(mut self, offset: IVec3) -> Self {
    self.offset = offset;
    self
  }

  #[inline]
  pub fn chunk_size(&self) -> u32 {
    self.chunk_size
  }

  #[inline]
  pub fn data_width_size(&self) -> u32 {
    self.data_width_size
  }

  #[inline]
  pub fn data_area_size(&self) -> u32 {
    self.data_area_size
  }

  #[inline]
  pub fn data_volume_size(&self) -> u32 {
    self.data_volume_size
  }

  #[inline]
  pub fn cubes_per_octree_leaf(&self) -> u32 {
    self.cubes_per_octree_leaf
  }

  #[inline]
  pub fn levels_of_detail(&self) -> u8 {
    self.levels_of_detail
  }

  /// LOD of the octree root covering a whole chunk.
  #[inline]
  pub fn root_lod(&self) -> u8 {
    self.levels_of_detail - 1
  }

  #[inline]
  pub fn density_threshold(&self) -> u8 {
    self.density_threshold
  }

  #[inline]
  pub fn resolution(&self) -> f32 {
    self.resolution
  }

  #[inline]
  pub fn offset(&self) -> IVec3 {
    self.offset
  }

  #[inline]
  pub fn is_solid(&self, density: u8) -> bool {
    density >= self.density_threshold
  }

  /// Edge length in voxels of an octree node at `lod`.
  #[inline]
  pub fn node_size(&self, lod: u8) -> i32 {
    (self.cubes_per_octree_leaf << lod) as i32
  }

  /// Linear index from data coordinates (each in `[0, width)`).
  #[inline]
  pub fn data_index(&self, x: usize, y: usize, z: usize) -> usize {
    let w = self.data_width_size as usize;
    x + y * w + z * w * w
  }

  /// Linear index of a chunk-local voxel position, `None` outside the padded
  /// range `[-1, chunk_size + 1]`.
  #[inline]
  pub fn voxel_index(&self, local: IVec3) -> Option<usize> {
    let d = local + IVec3::ONE;
    let w = self.data_width_size as i32;
    if d.min_element() < 0 || d.max_element() >= w {
      return None;
    }
    Some(self.data_index(d.x as usize, d.y as usize, d.z as usize))
  }

  /// Chunk-local voxel position of a linear index.
  #[inline]
  pub fn voxel_position(&self, index: usize) -> IVec3 {
    let w = self.data_width_size as usize;
    let x = index % w;
    let y = (index / w) % w;
    let z = index / (w * w);
    IVec3::new(x as i32, y as i32, z as i32) - IVec3::ONE
  }

  /// Global voxel position of a chunk's local origin.
  #[inline]
  pub fn chunk_origin(&self, chunk: IVec3) -> IVec3 {
    chunk * self.chunk_size as i32
  }

  /// Chunk whose interior `[0, chunk_size)` holds a global voxel.
  #[inline]
  pub fn chunk_of_voxel(&self, global: IVec3) -> IVec3 {
    global.div_euclid(IVec3::splat(self.chunk_size as i32))
  }

  /// Convert a global voxel-space position to world space.
  #[inline]
  pub fn voxel_to_world(&self, voxel: Vec3) -> Vec3 {
    (voxel + self.offset.as_vec3()) * self.resolution
  }

  /// Convert a world-space position to global voxel space.
  #[inline]
  pub fn world_to_voxel(&self, world: Vec3) -> Vec3 {
    world / self.resolution - self.offset.as_vec3()
  }
}

impl Default for ChunkConfig {
  fn default() -> Self {
    let width = DEFAULT_CHUNK_SIZE + 3;
    Self {
      chunk_size: DEFAULT_CHUNK_SIZE,
      data_width_size: width,
      data_area_size: width * width,
      data_volume_size: width * width * width,
      cubes_per_octree_leaf: DEFAULT_CHUNK_SIZE >> (DEFAULT_LEVELS_OF_DETAIL - 1),
      levels_of_detail: DEFAULT_LEVELS_OF_DETAIL,
      density_threshold: DEFAULT_DENSITY_THRESHOLD,
      resolution: 1.0,
      offset: IVec3::ZERO,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
