//! Regular cell sweep over one octree leaf.

use glam::IVec3;
use smallvec::SmallVec;

use super::vertex::VertexSampler;
use crate::config::ChunkConfig;
use crate::storage::VoxelBuffer;
use crate::tables::{
  edge_direction, edge_point0, edge_point1, edge_slot, regular_tables, EDGE_OWNED, REGULAR_CORNERS,
};
use crate::types::MeshOutput;

const NO_VERTEX: u32 = u32::MAX;

/// One deck of per-cube cached vertex indices (slots 1..=3 used).
type CacheDeck = Vec<[u32; 4]>;

/// Extract the regular-cell mesh of the leaf at chunk-local `origin`.
///
/// The leaf spans `cubes_per_octree_leaf` cubes per axis, each `1 << lod`
/// voxels wide. Vertex positions are chunk-local, in world units.
#[tracing::instrument(level = "trace", skip(buffer, config))]
pub fn extract_regular(buffer: &VoxelBuffer, config: &ChunkConfig, origin: IVec3, lod: u8) -> MeshOutput {
  let tables = regular_tables();
  let sampler = VertexSampler::new(buffer, config);
  let n = config.cubes_per_octree_leaf() as usize;
  let step = 1i32 << lod;

  let mut output = MeshOutput::new();
  let mut decks: [CacheDeck; 2] = [vec![[NO_VERTEX; 4]; n * n], vec![[NO_VERTEX; 4]; n * n]];

  for y in 0..n {
    let [even, odd] = &mut decks;
    let (current, previous) = if y & 1 == 0 { (even, odd) } else { (odd, even) };

    for z in 0..n {
      for x in 0..n {
        let cube = origin + IVec3::new(x as i32, y as i32, z as i32) * step;

        let mut case = 0u8;
        for (i, corner) in REGULAR_CORNERS.iter().enumerate() {
          if sampler.is_solid(cube + *corner * step) {
            case |= 1 << i;
          }
        }
        // 0 and 255 both xor to zero against corner 7's sign
        if case ^ 0u8.wrapping_sub(case >> 7) == 0 {
          continue;
        }

        let valid = (x > 0) as u8 | ((y > 0) as u8) << 1 | ((z > 0) as u8) << 2;
        let mut local: SmallVec<[u32; 12]> = SmallVec::new();

        for &code in tables.vertex_codes(case) {
          let dir = edge_direction(code);
          let slot = edge_slot(code);

          let mut index = NO_VERTEX;
          if dir != EDGE_OWNED && dir & valid == dir {
            let (dx, dy, dz) = ((dir & 1) as usize, ((dir >> 1) & 1) as usize, ((dir >> 2) & 1) as usize);
            let deck = if dy == 1 { &*previous } else { &*current };
            index = deck[(x - dx) + (z - dz) * n][slot];
          }

          if index == NO_VERTEX {
            let a = cube + REGULAR_CORNERS[edge_point0(code) as usize] * step;
            let b = cube + REGULAR_CORNERS[edge_point1(code) as usize] * step;
            index = output.vertices.len() as u32;
            output.vertices.push(sampler.vertex(a, b));
          }

          if dir == EDGE_OWNED {
            current[x + z * n][slot] = index;
          }
          local.push(index);
        }

        let class = tables.class_of(case);
        for tri in class.indices().chunks_exact(3) {
          let (a, b, c) = (local[tri[0] as usize], local[tri[1] as usize], local[tri[2] as usize]);
          let v = &output.vertices;
          if sampler.is_degenerate(&v[a as usize], &v[b as usize], &v[c as usize]) {
            continue;
          }
          output.indices.extend_from_slice(&[a, b, c]);
        }
      }
    }
  }

  output
}

#[cfg(test)]
#[path = "regular_test.rs"]
mod regular_test;
