//! Transition cell sweep over the six faces of one octree leaf.
//!
//! Each face is scanned as a `cubes_per_octree_leaf²` grid of transition
//! cells through a face-local frame `(u, v)`:
//!
//! ```text
//!   face   axis   u   v   inward
//!   -X      X     Y   Z    +X
//!   -Y      Y     Z   X    +Y
//!   -Z      Z     X   Y    +Z
//!   +X      X     Y   Z    -X     (mirrored: winding flips)
//!   +Y      Y     Z   X    -Y
//!   +Z      Z     X   Y    -Z
//! ```
//!
//! All thirteen cell points lie in the face plane, so the seam fills the gap
//! between the finer neighbour's contour and this leaf's own contour without
//! moving any regular vertex.

use glam::IVec3;
use smallvec::SmallVec;

use super::vertex::VertexSampler;
use crate::config::ChunkConfig;
use crate::octree::Face;
use crate::storage::VoxelBuffer;
use crate::tables::{
  edge_direction, edge_point0, edge_point1, edge_slot, transition_tables, EDGE_OWNED, TRANSITION_POINTS,
};
use crate::types::TransitionMeshOutput;

const NO_VERTEX: u32 = u32::MAX;

/// Per-cell cached vertex indices (slots 1..=6 used).
type CacheRow = Vec<[u32; 8]>;

/// Extract the seam geometry of every face of the leaf at `origin`.
///
/// LOD 0 leaves are never coarser than a neighbour and produce nothing.
#[tracing::instrument(level = "trace", skip(buffer, config))]
pub fn extract_transition(
  buffer: &VoxelBuffer,
  config: &ChunkConfig,
  origin: IVec3,
  lod: u8,
) -> TransitionMeshOutput {
  let mut output = TransitionMeshOutput::new();
  if lod == 0 {
    return output;
  }

  let sampler = VertexSampler::new(buffer, config);
  for face in Face::ALL {
    let start = output.indices.len();
    extract_face(&sampler, config, origin, lod, face, &mut output);
    output.face_ranges[face.index()] = start..output.indices.len();
  }
  output
}

fn extract_face(
  sampler: &VertexSampler<'_>,
  config: &ChunkConfig,
  origin: IVec3,
  lod: u8,
  face: Face,
  output: &mut TransitionMeshOutput,
) {
  let tables = transition_tables();
  let n = config.cubes_per_octree_leaf() as usize;
  let step = 1i32 << lod;
  let half = step / 2;

  let axis = face.axis();
  let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
  let mut base = origin;
  if face.is_positive() {
    base[axis] += config.node_size(lod);
  }
  let mirrored = face.is_positive();

  let mut rows: [CacheRow; 2] = [vec![[NO_VERTEX; 8]; n], vec![[NO_VERTEX; 8]; n]];

  for j in 0..n {
    let [even, odd] = &mut rows;
    let (current, previous) = if j & 1 == 0 { (even, odd) } else { (odd, even) };

    for i in 0..n {
      let point = |p: u8| -> IVec3 {
        let (pu, pv) = TRANSITION_POINTS[p as usize];
        let mut pos = base;
        pos[u] += i as i32 * step + pu as i32 * half;
        pos[v] += j as i32 * step + pv as i32 * half;
        pos
      };

      let mut case = 0u16;
      for p in 0..9u8 {
        if sampler.is_solid(point(p)) {
          case |= 1 << p;
        }
      }
      if case == 0 || case == 511 {
        continue;
      }

      let valid = (i > 0) as u8 | ((j > 0) as u8) << 1;
      let mut local: SmallVec<[u32; 16]> = SmallVec::new();

      for &code in tables.vertex_codes(case) {
        let dir = edge_direction(code);
        let slot = edge_slot(code);

        let mut index = NO_VERTEX;
        if dir == 1 && valid & 1 != 0 {
          index = current[i - 1][slot];
        } else if dir == 2 && valid & 2 != 0 {
          index = previous[i][slot];
        }

        if index == NO_VERTEX {
          index = output.vertices.len() as u32;
          output
            .vertices
            .push(sampler.vertex(point(edge_point0(code)), point(edge_point1(code))));
        }

        if dir == EDGE_OWNED {
          current[i][slot] = index;
        }
        local.push(index);
      }

      let (class, flipped) = tables.class_of(case);
      let reverse = flipped != mirrored;
      for tri in class.indices().chunks_exact(3) {
        let (a, mut b, mut c) = (local[tri[0] as usize], local[tri[1] as usize], local[tri[2] as usize]);
        if reverse {
          std::mem::swap(&mut b, &mut c);
        }
        let vs = &output.vertices;
        if sampler.is_degenerate(&vs[a as usize], &vs[b as usize], &vs[c as usize]) {
          continue;
        }
        output.indices.extend_from_slice(&[a, b, c]);
      }
    }
  }
}

#[cfg(test)]
#[path = "transition_test.rs"]
mod transition_test;
