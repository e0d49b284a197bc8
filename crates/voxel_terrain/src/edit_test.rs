use super::*;
use crate::chunk::BaseChunk;
use crate::samplers::UniformSource;
use crate::source::{NoOverrides, OverrideSource, SealedBoundsOverrides};
use crate::storage::DenseBufferPool;
use crate::test_utils::config;

fn registry(
  config: &ChunkConfig,
  coords: &[IVec3],
  fill: VoxelData,
  overrides: &dyn OverrideSource,
  pool: &mut DenseBufferPool,
) -> HashMap<IVec3, BaseChunk> {
  coords
    .iter()
    .map(|&coord| {
      let mut chunk = BaseChunk::new(coord, config);
      chunk
        .initialize(config, &UniformSource(fill), overrides, pool)
        .expect("initialize");
      (coord, chunk)
    })
    .collect()
}

fn apply(batch: &EditBatch, chunks: &mut HashMap<IVec3, BaseChunk>, config: &ChunkConfig, pool: &mut DenseBufferPool) {
  for (coord, edits) in &batch.chunks {
    let chunk = chunks.get_mut(coord).expect("chunk");
    chunk.apply_voxel_edits(edits, config, pool).expect("apply");
  }
}

#[test]
fn test_owning_chunks() {
  let config = config(16, 2);
  let rules = EditRules::new();
  let propagator = EditPropagator::new(&config, &rules);

  assert_eq!(propagator.owning_chunks(IVec3::splat(5)), vec![IVec3::ZERO]);
  assert_eq!(
    propagator.owning_chunks(IVec3::new(16, 5, 5)),
    vec![IVec3::X, IVec3::ZERO]
  );
  assert_eq!(
    propagator.owning_chunks(IVec3::new(17, 5, 5)),
    vec![IVec3::X, IVec3::ZERO]
  );
  assert_eq!(
    propagator.owning_chunks(IVec3::new(15, 5, 5)),
    vec![IVec3::ZERO, IVec3::X]
  );
  assert_eq!(propagator.owning_chunks(IVec3::new(18, 5, 5)), vec![IVec3::X]);
  assert_eq!(propagator.owning_chunks(IVec3::ZERO).len(), 8);
}

#[test]
fn test_resolve_rules() {
  let air = VoxelData::AIR;
  let rock = VoxelData::new(200, 2);

  assert_eq!(resolve(air, 255, 5), Some(VoxelData::new(255, 5)));
  // Not enough to repaint.
  assert_eq!(resolve(rock, 10, 5), Some(VoxelData::new(210, 2)));
  // Dug through: material follows the edit.
  assert_eq!(resolve(rock, -250, 0), Some(VoxelData::new(0, 0)));
  // Clamped to an unchanged value.
  assert_eq!(resolve(VoxelData::new(255, 2), 10, 2), None);
}

/// An edit on the shared border lands identically in both chunks.
#[test]
fn test_cross_chunk_edit_consistency() {
  let config = config(16, 2);
  let rules = EditRules::new();
  let mut pool = DenseBufferPool::new();
  let mut chunks = registry(&config, &[IVec3::ZERO, IVec3::X], VoxelData::AIR, &NoOverrides, &mut pool);

  let propagator = EditPropagator::new(&config, &rules);
  let batch = propagator.propagate(&[WorldEdit::sphere(Vec3::new(16.0, 8.0, 8.0), 3.0, 255, 5)], &chunks);
  assert!(batch.missing.is_empty());
  assert!(batch.edits_for(IVec3::ZERO).is_some());
  assert!(batch.edits_for(IVec3::X).is_some());
  apply(&batch, &mut chunks, &config, &mut pool);

  let a = &chunks[&IVec3::ZERO];
  let b = &chunks[&IVec3::X];
  assert_eq!(a.query_voxel(&config, IVec3::new(16, 8, 8)), Some(VoxelData::new(255, 5)));
  assert_eq!(b.query_voxel(&config, IVec3::new(0, 8, 8)), Some(VoxelData::new(255, 5)));

  let mut shared = 0;
  for z in 4..=12 {
    for y in 4..=12 {
      for x in 12..=20 {
        let global = IVec3::new(x, y, z);
        let in_a = a.query_voxel(&config, global - config.chunk_origin(IVec3::ZERO));
        let in_b = b.query_voxel(&config, global - config.chunk_origin(IVec3::X));
        if let (Some(va), Some(vb)) = (in_a, in_b) {
          assert_eq!(va, vb, "voxel {global} differs between chunks");
          shared += 1;
        }
      }
    }
  }
  // Global x 15..=17 is held by both chunks.
  assert_eq!(shared, 3 * 9 * 9);
}

#[test]
fn test_pinned_and_missing() {
  let config = config(16, 2);
  let rules = EditRules::new();
  let mut pool = DenseBufferPool::new();
  let sealed = SealedBoundsOverrides::new(IVec3::ZERO, IVec3::ZERO);
  let chunks = registry(&config, &[IVec3::ZERO], VoxelData::AIR, &sealed, &mut pool);

  let propagator = EditPropagator::new(&config, &rules);
  let batch = propagator.propagate(&[WorldEdit::sphere(Vec3::new(0.0, 8.0, 8.0), 2.0, 255, 5)], &chunks);

  assert_eq!(batch.missing, vec![IVec3::NEG_X]);
  assert!(batch.rejected > 0);
  let edits = batch.edits_for(IVec3::ZERO).expect("edits");
  assert!(!edits.is_empty());
  for edit in edits {
    assert!(config.voxel_position(edit.index).x >= 1);
  }
}

#[test]
fn test_non_diggable_material() {
  let config = config(16, 2);
  let rules = EditRules::new().with_non_diggable(7);
  let mut pool = DenseBufferPool::new();
  let chunks = registry(&config, &[IVec3::ZERO], VoxelData::new(200, 7), &NoOverrides, &mut pool);
  let propagator = EditPropagator::new(&config, &rules);

  let dig = propagator.propagate(&[WorldEdit::sphere(Vec3::splat(8.0), 2.0, -100, 0)], &chunks);
  assert!(dig.is_empty());
  assert!(dig.rejected > 0);

  let fill = propagator.propagate(&[WorldEdit::sphere(Vec3::splat(8.0), 2.0, 20, 3)], &chunks);
  let edits = fill.edits_for(IVec3::ZERO).expect("edits");
  assert!(edits.iter().all(|e| e.material == 7 && e.density > 200));
}

#[test]
fn test_box_and_stacked_edits() {
  let config = config(16, 2);
  let rules = EditRules::new();
  let mut pool = DenseBufferPool::new();
  let chunks = registry(&config, &[IVec3::ZERO], VoxelData::AIR, &NoOverrides, &mut pool);
  let propagator = EditPropagator::new(&config, &rules);

  let cuboid = WorldEdit::cuboid(Vec3::splat(2.0), Vec3::splat(3.0), 150, 4);
  let batch = propagator.propagate(&[cuboid], &chunks);
  assert_eq!(batch.edits_for(IVec3::ZERO).map(<[VoxelEdit]>::len), Some(8));

  // The second edit sees the first: 100 + 100, material kept from the first.
  let center = Vec3::splat(8.0);
  let batch = propagator.propagate(
    &[WorldEdit::sphere(center, 2.0, 100, 1), WorldEdit::sphere(center, 2.0, 100, 9)],
    &chunks,
  );
  let index = config.voxel_index(IVec3::splat(8)).unwrap();
  let edit = batch
    .edits_for(IVec3::ZERO)
    .and_then(|edits| edits.iter().find(|e| e.index == index))
    .copied()
    .expect("centre edited");
  assert_eq!((edit.density, edit.material), (200, 1));
}
