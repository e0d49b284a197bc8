//! Shared fixtures for unit tests.

use std::collections::HashMap;

use glam::{IVec3, Vec3};

use crate::config::ChunkConfig;
use crate::storage::VoxelBuffer;
use crate::types::{MeshVertex, VoxelData};

pub fn config(chunk_size: u32, levels_of_detail: u8) -> ChunkConfig {
  ChunkConfig::new(chunk_size, levels_of_detail).expect("valid test config")
}

/// `below` for local `y < height`, `above` elsewhere.
pub fn layered_buffer(config: &ChunkConfig, height: i32, below: VoxelData, above: VoxelData) -> VoxelBuffer {
  let mut buffer = VoxelBuffer::new(config);
  buffer.fill_with(|p| if p.y < height { below } else { above });
  buffer
}

/// Density for a signed distance (positive inside), never equal to 128.
pub fn density_from_distance(inside: f32) -> u8 {
  if inside > 0.0 {
    129 + (inside * 40.0).min(126.0) as u8
  } else {
    127 - (-inside * 40.0).min(127.0) as u8
  }
}

/// Solid ball around a chunk-local `center`.
pub fn sphere_buffer(config: &ChunkConfig, center: Vec3, radius: f32, material: u8) -> VoxelBuffer {
  let mut buffer = VoxelBuffer::new(config);
  buffer.fill_with(|p| {
    let inside = radius - p.as_vec3().distance(center);
    VoxelData::new(density_from_distance(inside), material)
  });
  buffer
}

pub fn triangle_normal(vertices: &[MeshVertex], tri: &[u32]) -> Vec3 {
  let p = |i: u32| Vec3::from_array(vertices[i as usize].position);
  let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
  (b - a).cross(c - a)
}

/// Every undirected edge is used by exactly two triangles, once per direction.
pub fn assert_closed_manifold(indices: &[u32]) {
  let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
  for tri in indices.chunks_exact(3) {
    for k in 0..3 {
      *directed.entry((tri[k], tri[(k + 1) % 3])).or_default() += 1;
    }
  }
  for (&(a, b), &count) in &directed {
    assert_eq!(count, 1, "directed edge {}->{} used {} times", a, b, count);
    assert!(
      directed.contains_key(&(b, a)),
      "edge {}->{} has no opposite",
      a,
      b
    );
  }
}

/// Chunk-local voxel positions of every vertex, rounded to the grid.
pub fn vertex_cells(vertices: &[MeshVertex], resolution: f32) -> Vec<IVec3> {
  vertices
    .iter()
    .map(|v| (Vec3::from_array(v.position) / resolution).floor().as_ivec3())
    .collect()
}
