//! Edge vertex resolution shared by regular and transition cells.
//!
//! ```text
//!   p0 ●━━━━━━━━━━━━━━━━━━━━━━━● p1       coarse edge, step 4
//!   p0 ●━━━━━━━━━━━● mid                  mid matches p0 → p0 = mid
//!               mid ●━━━━━● p1            ...until step 1
//!                    ●──x──●              lerp at threshold
//! ```
//!
//! Refinement always ends on a unit edge, so a coarse leaf and a finer
//! neighbour place the vertex of a shared edge at the same full-resolution
//! crossing.

use glam::{IVec3, Vec3};
use smallvec::SmallVec;

use crate::config::ChunkConfig;
use crate::storage::VoxelBuffer;
use crate::types::{MaterialId, MeshVertex};

/// Minimum triangle area, in squared voxel units, kept by extraction.
pub const DEGENERATE_AREA_EPSILON: f32 = 1e-6;

const NEIGHBORS: [IVec3; 6] = [
  IVec3::NEG_X,
  IVec3::X,
  IVec3::NEG_Y,
  IVec3::Y,
  IVec3::NEG_Z,
  IVec3::Z,
];

/// Reads densities from a padded buffer and builds vertices on cell edges.
pub struct VertexSampler<'a> {
  buffer: &'a VoxelBuffer,
  threshold: u8,
  resolution: f32,
  min_area: f32,
}

impl<'a> VertexSampler<'a> {
  pub fn new(buffer: &'a VoxelBuffer, config: &ChunkConfig) -> Self {
    let resolution = config.resolution();
    Self {
      buffer,
      threshold: config.density_threshold(),
      resolution,
      min_area: DEGENERATE_AREA_EPSILON * resolution * resolution,
    }
  }

  #[inline]
  pub fn density(&self, p: IVec3) -> u8 {
    self.buffer.density(p)
  }

  #[inline]
  pub fn is_solid(&self, p: IVec3) -> bool {
    self.density(p) >= self.threshold
  }

  /// Central-difference density gradient; points into solid space.
  #[inline]
  pub fn gradient(&self, p: IVec3) -> Vec3 {
    let d = |offset: IVec3| self.density(p + offset) as f32;
    Vec3::new(
      d(IVec3::X) - d(IVec3::NEG_X),
      d(IVec3::Y) - d(IVec3::NEG_Y),
      d(IVec3::Z) - d(IVec3::NEG_Z),
    )
  }

  /// Vertex on the axis-aligned edge `a`–`b`, whose endpoints differ in
  /// solidity.
  pub fn vertex(&self, a: IVec3, b: IVec3) -> MeshVertex {
    let (mut p0, mut p1) = if (b - a).element_sum() < 0 { (b, a) } else { (a, b) };

    while (p1 - p0).abs().max_element() > 1 {
      let mid = (p0 + p1) / 2;
      if self.is_solid(mid) == self.is_solid(p0) {
        p0 = mid;
      } else {
        p1 = mid;
      }
    }

    let d0 = self.density(p0) as f32;
    let d1 = self.density(p1) as f32;
    let denom = d1 - d0;
    let t = if denom.abs() < f32::EPSILON {
      0.5
    } else {
      ((self.threshold as f32 - d0) / denom).clamp(0.0, 1.0)
    };

    let position = p0.as_vec3().lerp(p1.as_vec3(), t) * self.resolution;
    let normal = -self.gradient(p0).lerp(self.gradient(p1), t);
    let normal = normal.normalize_or(Vec3::Y);
    let (materials, blend) = self.material_blend(p0, p1, t);

    MeshVertex {
      position: position.to_array(),
      normal: normal.to_array(),
      materials,
      blend,
    }
  }

  /// Two strongest materials around the edge and the secondary's share.
  ///
  /// Each endpoint's six neighbours vote with `density × weight`, endpoint 0
  /// weighted `1 − t` and endpoint 1 weighted `t`; air does not vote.
  pub fn material_blend(&self, p0: IVec3, p1: IVec3, t: f32) -> ([MaterialId; 2], f32) {
    let mut votes: SmallVec<[(MaterialId, f32); 12]> = SmallVec::new();
    for (p, weight) in [(p0, 1.0 - t), (p1, t)] {
      if weight <= 0.0 {
        continue;
      }
      for offset in NEIGHBORS {
        let voxel = self.buffer.sample(p + offset);
        if voxel.density == 0 {
          continue;
        }
        let vote = voxel.density as f32 * weight;
        match votes.iter_mut().find(|(m, _)| *m == voxel.material) {
          Some((_, w)) => *w += vote,
          None => votes.push((voxel.material, vote)),
        }
      }
    }

    votes.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    match votes.as_slice() {
      [] => {
        let solid = if self.is_solid(p0) { p0 } else { p1 };
        let material = self.buffer.sample(solid).material;
        ([material, material], 0.0)
      }
      [(m, _)] => ([*m, *m], 0.0),
      [(m1, w1), (m2, w2), ..] => ([*m1, *m2], w2 / (w1 + w2)),
    }
  }

  /// True when the triangle is too small to keep.
  #[inline]
  pub fn is_degenerate(&self, a: &MeshVertex, b: &MeshVertex, c: &MeshVertex) -> bool {
    triangle_area(a.position, b.position, c.position) < self.min_area
  }
}

#[inline]
pub fn triangle_area(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> f32 {
  let a = Vec3::from_array(a);
  (Vec3::from_array(b) - a).cross(Vec3::from_array(c) - a).length() * 0.5
}

#[cfg(test)]
#[path = "vertex_test.rs"]
mod vertex_test;
