use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::presentation::MeshHandlePool;
use crate::test_utils::config;

fn context<'a>(config: &'a ChunkConfig, ranges: &'a LodRanges, viewer: Vec3) -> LodContext<'a> {
  LodContext {
    chunk: IVec3::ZERO,
    config,
    ranges,
    viewer,
  }
}

fn settle(node: &mut OctreeNode) {
  node.for_each_leaf_mut(&mut |_, _, leaf| leaf.apply_regular(MeshOutput::new()));
}

// =========================================================================
// Structure
// =========================================================================

#[test]
fn test_root_spans_chunk() {
  let config = config(32, 3);
  let root = OctreeNode::root(&config);
  assert_eq!(root.lod(), 2);
  assert_eq!(root.size(), 32);
  assert_eq!(root.bounds(), VoxelBounds::new(IVec3::ZERO, IVec3::splat(32)));
  assert!(matches!(root.state(), NodeState::Uninitialized));
}

/// Child index bits select +X, +Y, +Z halves.
#[test]
fn test_subdivide_child_offsets() {
  let config = config(32, 3);
  let mut root = OctreeNode::root(&config);
  let mut released = Vec::new();
  assert!(root.subdivide(&config, &mut released));
  assert!(!root.subdivide(&config, &mut released));

  let children = root.children().expect("branch");
  assert_eq!(children[0].local_position(), IVec3::ZERO);
  assert_eq!(children[1].local_position(), IVec3::new(16, 0, 0));
  assert_eq!(children[2].local_position(), IVec3::new(0, 16, 0));
  assert_eq!(children[4].local_position(), IVec3::new(0, 0, 16));
  assert_eq!(children[7].local_position(), IVec3::splat(16));
  assert!(children.iter().all(|c| c.lod() == 1 && c.size() == 16));
}

#[test]
fn test_lod_zero_never_subdivides() {
  let config = config(8, 1);
  let mut root = OctreeNode::root(&config);
  assert_eq!(root.lod(), 0);
  assert!(!root.subdivide(&config, &mut Vec::new()));
  assert!(root.make_leaf(&mut Vec::new()));
  assert!(!root.make_leaf(&mut Vec::new()));
}

/// Collapsing a branch releases every mesh handle beneath it.
#[test]
fn test_make_leaf_disposes_children() {
  let config = config(32, 3);
  let mut pool = MeshHandlePool::new();
  let mut root = OctreeNode::root(&config);
  let mut released = Vec::new();
  root.subdivide(&config, &mut released);

  let mut handles = Vec::new();
  if let NodeState::Branch(children) = &mut root.state {
    for child in children.iter_mut() {
      child.make_leaf(&mut released);
      let handle = pool.acquire(child.lod());
      child.for_each_leaf_mut(&mut |_, _, leaf| {
        leaf.set_handle(Some(handle));
      });
      handles.push(handle);
    }
  }
  assert_eq!(root.leaf_count(), 8);
  assert!(released.is_empty());

  assert!(root.make_leaf(&mut released));
  assert_eq!(root.leaf_count(), 1);
  assert_eq!(released.len(), 8);
  for handle in handles {
    assert!(released.contains(&handle));
  }
  assert!(root.leaf().is_some_and(LeafData::needs_extraction));
}

// =========================================================================
// LOD validation
// =========================================================================

#[test]
fn test_validate_near_viewer_refines_corner() {
  let config = config(32, 3);
  let ranges = LodRanges::new(&config);
  let mut root = OctreeNode::root(&config);
  let mut changes = LodChanges::default();
  root.validate_lods(&context(&config, &ranges, Vec3::splat(4.0)), &mut changes);

  // Octants within one step of the viewer refine to LOD 0, the rest stay
  // at LOD 1.
  let leaves = root.leaves();
  assert_eq!(leaves.len(), 36);
  assert_eq!(leaves.iter().filter(|(_, lod)| *lod == 0).count(), 32);
  assert!(leaves.contains(&(IVec3::new(16, 16, 0), 1)));
  assert!(leaves.contains(&(IVec3::splat(16), 1)));
  assert_eq!(changes.created.len(), 36);

  // A second pass with the same viewer changes nothing.
  let mut again = LodChanges::default();
  root.validate_lods(&context(&config, &ranges, Vec3::splat(4.0)), &mut again);
  assert!(again.created.is_empty());
  assert!(again.released.is_empty());
}

#[test]
fn test_validate_far_viewer_collapses() {
  let config = config(32, 3);
  let ranges = LodRanges::new(&config);
  let mut root = OctreeNode::root(&config);
  root.validate_lods(&context(&config, &ranges, Vec3::splat(4.0)), &mut LodChanges::default());

  let mut pool = MeshHandlePool::new();
  root.for_each_leaf_mut(&mut |_, lod, leaf| {
    leaf.set_handle(Some(pool.acquire(lod)));
  });

  let mut changes = LodChanges::default();
  root.validate_lods(&context(&config, &ranges, Vec3::splat(5000.0)), &mut changes);
  assert_eq!(root.leaf_count(), 1);
  assert_eq!(changes.created, vec![root.key(IVec3::ZERO)]);
  assert_eq!(changes.released.len(), 36);
}

/// Floor-enforced bands keep face-adjacent leaves within one LOD.
#[test]
fn test_adjacent_leaves_within_one_lod() {
  let config = config(64, 4);
  let ranges = LodRanges::new(&config);
  let mut rng = StdRng::seed_from_u64(7);

  for _ in 0..32 {
    let viewer = Vec3::new(
      rng.random_range(-40.0..100.0),
      rng.random_range(-40.0..100.0),
      rng.random_range(-40.0..100.0),
    );
    let mut root = OctreeNode::root(&config);
    root.validate_lods(&context(&config, &ranges, viewer), &mut LodChanges::default());

    for (position, lod) in root.leaves() {
      let key = LeafKey {
        chunk: IVec3::ZERO,
        position,
        lod,
      };
      for face in Face::ALL {
        for (chunk, probe) in key.face_probes(face, &config) {
          if chunk != IVec3::ZERO {
            continue;
          }
          let neighbor = root.leaf_at(probe).expect("interior probe hits a leaf");
          assert!(
            neighbor.lod().abs_diff(lod) <= 1,
            "viewer {viewer}: leaf {position} lod {lod} next to lod {}",
            neighbor.lod()
          );
        }
      }
    }
  }
}

#[test]
fn test_validate_edits_touches_only_intersecting_leaves() {
  let config = config(32, 3);
  let ranges = LodRanges::new(&config);
  let mut root = OctreeNode::root(&config);
  root.validate_lods(&context(&config, &ranges, Vec3::splat(4.0)), &mut LodChanges::default());
  settle(&mut root);

  let mut touched = Vec::new();
  root.validate_edits(IVec3::ZERO, &VoxelBounds::from_point(IVec3::new(3, 3, 3)).expand(1), &mut touched);
  assert_eq!(touched.len(), 1);
  assert_eq!(touched[0].position, IVec3::ZERO);

  touched.clear();
  root.validate_edits(IVec3::ZERO, &VoxelBounds::from_point(IVec3::new(8, 3, 3)).expand(1), &mut touched);
  let positions: Vec<_> = touched.iter().map(|k| k.position).collect();
  assert_eq!(positions, vec![IVec3::ZERO, IVec3::new(8, 0, 0)]);

  let leaf = root.leaf_mut(IVec3::new(8, 0, 0), 0).expect("leaf");
  assert!(leaf.needs_extraction());
  let untouched = root.leaf_mut(IVec3::new(0, 8, 0), 0).expect("leaf");
  assert!(!untouched.needs_extraction());
}

// =========================================================================
// Lookup
// =========================================================================

#[test]
fn test_leaf_lookup() {
  let config = config(32, 3);
  let ranges = LodRanges::new(&config);
  let mut root = OctreeNode::root(&config);
  root.validate_lods(&context(&config, &ranges, Vec3::splat(4.0)), &mut LodChanges::default());

  let fine = root.leaf_at(IVec3::new(9, 1, 15)).expect("leaf");
  assert_eq!((fine.local_position(), fine.lod()), (IVec3::new(8, 0, 8), 0));
  let coarse = root.leaf_at(IVec3::splat(31)).expect("leaf");
  assert_eq!((coarse.local_position(), coarse.lod()), (IVec3::splat(16), 1));
  assert!(root.leaf_at(IVec3::new(32, 0, 0)).is_none());
  assert!(root.leaf_at(IVec3::new(-1, 0, 0)).is_none());

  assert!(root.leaf_mut(IVec3::splat(16), 1).is_some());
  assert!(root.leaf_mut(IVec3::splat(16), 0).is_none());
  assert!(root.leaf_mut(IVec3::new(8, 0, 0), 1).is_none());
}

#[test]
fn test_face_probes_cross_chunks() {
  let config = config(32, 3);
  let key = LeafKey {
    chunk: IVec3::ZERO,
    position: IVec3::ZERO,
    lod: 0,
  };
  let probes = key.face_probes(Face::NegX, &config);
  assert_eq!(probes[0], (IVec3::NEG_X, IVec3::new(31, 2, 2)));
  assert_eq!(probes[3], (IVec3::NEG_X, IVec3::new(31, 6, 6)));
  assert_eq!(
    key.face_probes(Face::PosX, &config)[1],
    (IVec3::ZERO, IVec3::new(8, 6, 2))
  );

  let edge = LeafKey {
    chunk: IVec3::new(2, 0, 0),
    position: IVec3::new(16, 16, 16),
    lod: 1,
  };
  // +Y scans (u, v) = (Z, X).
  assert_eq!(
    edge.face_probes(Face::PosY, &config)[1],
    (IVec3::new(2, 1, 0), IVec3::new(20, 0, 28))
  );
}

// =========================================================================
// Leaf meshes
// =========================================================================

fn triangle(offset: f32) -> Vec<MeshVertex> {
  (0..3)
    .map(|i| MeshVertex {
      position: [offset + i as f32, 0.0, 0.0],
      ..MeshVertex::default()
    })
    .collect()
}

#[test]
fn test_compose_filters_by_mask() {
  let mut leaf = LeafData::new();
  leaf.apply_regular(MeshOutput {
    vertices: triangle(0.0),
    indices: vec![0, 1, 2],
  });
  let mut transition = TransitionMeshOutput {
    vertices: triangle(10.0),
    indices: vec![0, 2, 1],
    ..TransitionMeshOutput::default()
  };
  transition.face_ranges[Face::NegX.index()] = 0..3;
  leaf.apply_transition(transition);
  assert!(leaf.is_dirty());

  let (vertices, indices) = leaf.compose();
  assert!(!leaf.is_dirty());
  assert_eq!(indices, vec![0, 1, 2]);
  assert_eq!(vertices.len(), 3);

  assert!(leaf.set_seam(Face::NegX, true));
  assert!(leaf.is_dirty());
  let (vertices, indices) = leaf.compose();
  assert_eq!(indices, vec![0, 1, 2, 3, 5, 4]);
  assert_eq!(vertices.len(), 6);

  // Seam on a face without transition geometry adds nothing.
  leaf.set_seam(Face::NegX, false);
  leaf.set_seam(Face::PosY, true);
  assert_eq!(leaf.compose().1.len(), 3);
}

#[test]
fn test_compose_empty_leaf() {
  let mut leaf = LeafData::new();
  leaf.apply_regular(MeshOutput::new());
  let (vertices, indices) = leaf.compose();
  assert!(vertices.is_empty());
  assert!(indices.is_empty());
}
