use super::*;
use crate::test_utils::{assert_closed_manifold, config, layered_buffer, sphere_buffer, triangle_normal};
use crate::types::VoxelData;
use glam::Vec3;
use std::collections::HashSet;

/// Distinct vertex positions, welding duplicates on the leaf's low faces.
fn welded_count(mesh: &MeshOutput) -> usize {
  mesh
    .vertices
    .iter()
    .map(|v| v.position.map(f32::to_bits))
    .collect::<HashSet<_>>()
    .len()
}

#[test]
fn test_uniform_buffers_produce_nothing() {
  let config = config(16, 2);
  let mut buffer = VoxelBuffer::new(&config);
  let empty = extract_regular(&buffer, &config, IVec3::ZERO, 1);
  assert!(empty.vertices.is_empty());
  assert!(empty.indices.is_empty());

  buffer.fill(VoxelData::new(255, 1));
  let full = extract_regular(&buffer, &config, IVec3::ZERO, 1);
  assert!(full.vertices.is_empty());
  assert!(full.indices.is_empty());
}

/// Density 200 below y = 64 and 50 above interpolates to y = 63.48.
#[test]
fn test_planar_crossing_at_lod0() {
  let config = config(64, 1);
  let buffer = layered_buffer(&config, 64, VoxelData::new(200, 0), VoxelData::new(50, 0));
  let mesh = extract_regular(&buffer, &config, IVec3::ZERO, 0);

  // Edges shared along the x = 0 and z = 0 rows are emitted once per cube.
  assert_eq!(mesh.vertices.len(), 65 * 65 + 2 * 63);
  assert_eq!(welded_count(&mesh), 65 * 65);
  assert_eq!(mesh.triangle_count(), 64 * 64 * 2);
  for vertex in &mesh.vertices {
    assert!((vertex.position[1] - 63.5).abs() < 0.05, "y = {}", vertex.position[1]);
    assert!(vertex.normal[1] > 0.99);
  }
  for tri in mesh.indices.chunks_exact(3) {
    assert!(triangle_normal(&mesh.vertices, tri).y > 0.0);
  }
}

/// Edge refinement keeps the coarse surface on the full-resolution crossing.
#[test]
fn test_planar_crossing_at_lod1() {
  let config = config(64, 2);
  let buffer = layered_buffer(&config, 64, VoxelData::new(200, 0), VoxelData::new(50, 0));
  let mesh = extract_regular(&buffer, &config, IVec3::ZERO, 1);

  assert_eq!(mesh.vertices.len(), 33 * 33 + 2 * 31);
  assert_eq!(welded_count(&mesh), 33 * 33);
  for vertex in &mesh.vertices {
    assert!((vertex.position[1] - 63.48).abs() < 1e-3);
  }
}

#[test]
fn test_sphere_is_closed_and_outward() {
  let config = config(16, 1);
  let center = Vec3::splat(8.0);
  let buffer = sphere_buffer(&config, center, 5.0, 2);
  let mesh = extract_regular(&buffer, &config, IVec3::ZERO, 0);

  assert!(mesh.triangle_count() > 100);
  assert_closed_manifold(&mesh.indices);

  for tri in mesh.indices.chunks_exact(3) {
    let normal = triangle_normal(&mesh.vertices, tri);
    let centroid = tri
      .iter()
      .map(|&i| Vec3::from_array(mesh.vertices[i as usize].position))
      .sum::<Vec3>()
      / 3.0;
    assert!(normal.dot(centroid - center) > 0.0);
  }
  for vertex in &mesh.vertices {
    assert_eq!(vertex.materials, [2, 2]);
    let radial = (Vec3::from_array(vertex.position) - center).normalize();
    assert!(Vec3::from_array(vertex.normal).dot(radial) > 0.5);
  }
}

/// A leaf only reads cubes inside its own region.
#[test]
fn test_leaf_origin_offsets_region() {
  let config = config(16, 2);
  let buffer = layered_buffer(&config, 4, VoxelData::new(255, 0), VoxelData::AIR);

  let low = extract_regular(&buffer, &config, IVec3::ZERO, 0);
  let high = extract_regular(&buffer, &config, IVec3::new(0, 8, 0), 0);
  assert_eq!(low.triangle_count(), 8 * 8 * 2);
  assert!(high.is_empty());
}

#[test]
fn test_resolution_scales_mesh() {
  let config = config(16, 1).with_resolution(2.0);
  let buffer = layered_buffer(&config, 8, VoxelData::new(255, 0), VoxelData::AIR);
  let mesh = extract_regular(&buffer, &config, IVec3::ZERO, 0);
  let max_x = mesh
    .vertices
    .iter()
    .map(|v| v.position[0])
    .fold(f32::MIN, f32::max);
  assert_eq!(max_x, 32.0);
}
