use super::*;

#[test]
fn test_single_voxel() {
  let bounds = VoxelBounds::from_point(IVec3::new(3, 4, 5));
  assert_eq!(bounds.size(), IVec3::ONE);
  assert!(bounds.contains(IVec3::new(3, 4, 5)));
  assert!(!bounds.contains(IVec3::new(3, 4, 6)));
}

#[test]
fn test_union_and_include() {
  let mut bounds = VoxelBounds::from_point(IVec3::ZERO);
  bounds.include(IVec3::new(2, -1, 4));
  assert_eq!(bounds, VoxelBounds::new(IVec3::new(0, -1, 0), IVec3::new(2, 0, 4)));

  let other = VoxelBounds::from_point(IVec3::splat(10));
  let union = bounds.union(&other);
  assert_eq!(union.min, IVec3::new(0, -1, 0));
  assert_eq!(union.max, IVec3::splat(10));
}

#[test]
fn test_intersects_touching() {
  let a = VoxelBounds::from_origin_size(IVec3::ZERO, 8);
  let b = VoxelBounds::from_origin_size(IVec3::new(8, 0, 0), 8);
  let c = VoxelBounds::from_origin_size(IVec3::new(9, 0, 0), 8);
  assert!(a.intersects(&b));
  assert!(b.intersects(&a));
  assert!(!a.intersects(&c));
  assert!(a.expand(1).intersects(&c));
}
