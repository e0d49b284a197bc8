use glam::Vec3;

use super::*;
use crate::error::ErrorKind;
use crate::octree::LodRanges;
use crate::samplers::{HeightPlaneSource, UniformSource};
use crate::source::{NoOverrides, SealedBoundsOverrides};
use crate::test_utils::config;

fn air_chunk(config: &ChunkConfig, pool: &mut DenseBufferPool) -> BaseChunk {
  let mut chunk = BaseChunk::new(IVec3::ZERO, config);
  chunk
    .initialize(config, &UniformSource(VoxelData::AIR), &NoOverrides, pool)
    .expect("initialize");
  chunk
}

fn build_leaves(chunk: &mut BaseChunk, config: &ChunkConfig) -> LodChanges {
  let ranges = LodRanges::new(config);
  let ctx = LodContext {
    chunk: chunk.coord(),
    config,
    ranges: &ranges,
    viewer: Vec3::ZERO,
  };
  let mut changes = LodChanges::default();
  chunk.validate_lods(&ctx, &mut changes);
  changes
}

#[test]
fn test_initialize_once() {
  let config = config(16, 2);
  let mut pool = DenseBufferPool::new();
  let mut chunk = air_chunk(&config, &mut pool);

  assert!(chunk.is_initialized());
  assert_eq!(chunk.store().run_count(), 1);
  assert!(chunk.store().validate(&config));
  assert!(chunk.density_range().is_skippable());
  assert_eq!(pool.checked_out_by(config.chunk_size()), None);

  let err = chunk
    .initialize(&config, &UniformSource(VoxelData::AIR), &NoOverrides, &mut pool)
    .unwrap_err();
  assert_eq!(err, TerrainError::ChunkAlreadyInitialized(IVec3::ZERO));
  assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_edit_before_initialize_is_rejected() {
  let config = config(16, 2);
  let mut pool = DenseBufferPool::new();
  let mut chunk = BaseChunk::new(IVec3::ZERO, &config);
  let edit = VoxelEdit {
    index: 0,
    density: 255,
    material: 1,
  };
  let err = chunk.apply_voxel_edits(&[edit], &config, &mut pool).unwrap_err();
  assert_eq!(err, TerrainError::ChunkNotInitialized(IVec3::ZERO));
  assert_eq!(pool.checked_out_by(config.chunk_size()), None);
}

/// One interior voxel flipped from air to solid in a skippable chunk.
#[test]
fn test_single_voxel_edit() {
  let config = config(16, 2);
  let mut pool = DenseBufferPool::new();
  let mut chunk = air_chunk(&config, &mut pool);
  assert!(build_leaves(&mut chunk, &config).created.is_empty());

  let target = IVec3::new(5, 6, 7);
  let edit = VoxelEdit {
    index: config.voxel_index(target).unwrap(),
    density: 255,
    material: 3,
  };
  let bounds = chunk
    .apply_voxel_edits(&[edit], &config, &mut pool)
    .unwrap()
    .expect("voxel changed");

  assert_eq!(bounds, VoxelBounds::from_point(target));
  assert_eq!(bounds.size(), IVec3::ONE);
  assert!(!chunk.density_range().is_skippable());
  assert_eq!(chunk.query_voxel(&config, target), Some(VoxelData::new(255, 3)));
  assert_eq!(chunk.query_voxel(&config, target + IVec3::X), Some(VoxelData::AIR));
  assert!(chunk.store().validate(&config));
  assert_eq!(chunk.store().run_count(), 3);
  assert_eq!(pool.checked_out_by(config.chunk_size()), None);

  // The chunk now produces leaves.
  assert!(!build_leaves(&mut chunk, &config).created.is_empty());

  // Writing the same value again changes nothing.
  let again = chunk.apply_voxel_edits(&[edit], &config, &mut pool).unwrap();
  assert_eq!(again, None);
}

#[test]
fn test_edit_bounds_union() {
  let config = config(16, 2);
  let mut pool = DenseBufferPool::new();
  let mut chunk = air_chunk(&config, &mut pool);

  let edits: Vec<_> = [IVec3::new(1, 2, 3), IVec3::new(4, 0, 9), IVec3::new(-1, 17, 3)]
    .into_iter()
    .map(|p| VoxelEdit {
      index: config.voxel_index(p).unwrap(),
      density: 200,
      material: 1,
    })
    .collect();
  let bounds = chunk.apply_voxel_edits(&edits, &config, &mut pool).unwrap();
  assert_eq!(
    bounds,
    Some(VoxelBounds::new(IVec3::new(-1, 0, 3), IVec3::new(4, 17, 9)))
  );
}

#[test]
fn test_checkout_conflict() {
  let config = config(16, 2);
  let mut pool = DenseBufferPool::new();
  let mut a = air_chunk(&config, &mut pool);
  let mut b = BaseChunk::new(IVec3::X, &config);
  b.initialize(&config, &UniformSource(VoxelData::AIR), &NoOverrides, &mut pool)
    .unwrap();

  let lease = a.checkout(&config, &mut pool).unwrap();
  let err = b.checkout(&config, &mut pool).unwrap_err();
  assert_eq!(
    err,
    TerrainError::BufferCheckedOut {
      bucket: 16,
      owner: IVec3::ZERO
    }
  );
  a.return_lease(&mut pool, lease, &config);
  assert!(b.checkout(&config, &mut pool).is_ok());
}

#[test]
fn test_sealed_chunk_pins_faces() {
  let config = config(16, 2);
  let mut pool = DenseBufferPool::new();
  let mut chunk = BaseChunk::new(IVec3::ZERO, &config);
  let sealed = SealedBoundsOverrides::new(IVec3::ZERO, IVec3::ZERO);
  chunk
    .initialize(&config, &HeightPlaneSource::new(8.5), &sealed, &mut pool)
    .unwrap();

  assert!(chunk.is_pinned(IVec3::new(0, 3, 3)));
  assert_eq!(chunk.query_voxel(&config, IVec3::new(0, 3, 3)), Some(VoxelData::AIR));
  assert!(config.is_solid(chunk.query_voxel(&config, IVec3::new(3, 3, 3)).unwrap().density));
  assert!(!chunk.density_range().is_skippable());
}

#[test]
fn test_dispose_releases_everything() {
  let config = config(16, 2);
  let mut pool = DenseBufferPool::new();
  let mut chunk = BaseChunk::new(IVec3::ZERO, &config);
  chunk
    .initialize(&config, &HeightPlaneSource::new(8.5), &NoOverrides, &mut pool)
    .unwrap();
  let changes = build_leaves(&mut chunk, &config);
  assert!(!changes.created.is_empty());
  assert_eq!(chunk.pending_extractions().len(), changes.created.len());

  let mut released = Vec::new();
  chunk.dispose(&mut released);
  assert!(!chunk.is_initialized());
  assert!(!chunk.store().is_populated());
  assert_eq!(chunk.octree().leaf_count(), 0);
}
