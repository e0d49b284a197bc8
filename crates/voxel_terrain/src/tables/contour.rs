//! Face-walking contour tracer used to build the cell tables.
//!
//! A cell is described by its sample points, the edges between them and the
//! polygonal faces bounding it. For a given solid/empty assignment every
//! face contributes line segments joining its crossing edges; the segments
//! chain into closed loops, which are oriented and fanned into triangles.
//!
//! Ambiguous faces (more than two crossings) pair the crossings bounding each
//! solid arc of the face cycle, so solid corners are always separated. Two
//! cells sharing a face see the same samples on it and therefore trace the
//! same segments there.

use glam::Vec3;
use smallvec::SmallVec;

/// Static description of a cell shape.
pub(super) struct CellTopology<'a> {
  /// Nominal sample positions, used only for orientation.
  pub points: &'a [Vec3],
  /// Point pairs that may carry a vertex.
  pub edges: &'a [[u8; 2]],
  /// Point cycles bounding the cell.
  pub faces: &'a [&'a [u8]],
}

/// Triangulated contour of one case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct CaseContour {
  /// Crossing edges in ascending edge order; position = local vertex index.
  pub vertex_edges: Vec<u8>,
  /// Triangles over local vertex indices, front faces pointing at empty space.
  pub triangles: Vec<[u8; 3]>,
}

impl CellTopology<'_> {
  fn edge_between(&self, a: u8, b: u8) -> Option<usize> {
    self
      .edges
      .iter()
      .position(|e| (e[0] == a && e[1] == b) || (e[0] == b && e[1] == a))
  }

  fn midpoint(&self, edge: usize) -> Vec3 {
    let [a, b] = self.edges[edge];
    (self.points[a as usize] + self.points[b as usize]) * 0.5
  }

  /// Trace the contour for the solidity given by `solid`.
  ///
  /// `planar_hint` orients loops whose solid-to-empty direction is
  /// perpendicular to their own normal (flat loops in a face plane).
  pub fn contour(&self, solid: impl Fn(u8) -> bool, planar_hint: Vec3) -> CaseContour {
    let mut segments: Vec<[usize; 2]> = Vec::new();

    for face in self.faces {
      let n = face.len();
      let hits: SmallVec<[(usize, usize); 8]> = (0..n)
        .filter_map(|i| {
          let (a, b) = (face[i], face[(i + 1) % n]);
          if solid(a) == solid(b) {
            return None;
          }
          self.edge_between(a, b).map(|edge| (i, edge))
        })
        .collect();

      for k in 0..hits.len() {
        let (pos, edge) = hits[k];
        if solid(face[(pos + 1) % n]) {
          segments.push([edge, hits[(k + 1) % hits.len()].1]);
        }
      }
    }

    let mut used = vec![false; segments.len()];
    let mut loops: Vec<Vec<usize>> = Vec::new();
    for first in 0..segments.len() {
      if used[first] {
        continue;
      }
      used[first] = true;
      let start = segments[first][0];
      let mut current = segments[first][1];
      let mut edges = vec![start];
      while current != start {
        edges.push(current);
        let next = (0..segments.len()).find(|&s| !used[s] && segments[s].contains(&current));
        let Some(next) = next else { break };
        used[next] = true;
        let [a, b] = segments[next];
        current = if a == current { b } else { a };
      }
      loops.push(edges);
    }

    let mut vertex_edges: Vec<u8> = loops.iter().flatten().map(|&e| e as u8).collect();
    vertex_edges.sort_unstable();
    vertex_edges.dedup();
    let local = |edge: usize| -> u8 {
      vertex_edges
        .iter()
        .position(|&e| e as usize == edge)
        .unwrap_or_default() as u8
    };

    let mut triangles = Vec::new();
    for mut edges in loops {
      if edges.len() < 3 {
        continue;
      }
      self.orient(&mut edges, &solid, planar_hint);
      for k in 1..edges.len() - 1 {
        triangles.push([local(edges[0]), local(edges[k]), local(edges[k + 1])]);
      }
    }

    CaseContour {
      vertex_edges,
      triangles,
    }
  }

  /// Reverse `edges` when its Newell normal points into solid space.
  fn orient(&self, edges: &mut [usize], solid: &impl Fn(u8) -> bool, planar_hint: Vec3) {
    let len = edges.len();
    let mut normal = Vec3::ZERO;
    let mut outward = Vec3::ZERO;
    for k in 0..len {
      normal += self.midpoint(edges[k]).cross(self.midpoint(edges[(k + 1) % len]));
      let [a, b] = self.edges[edges[k]];
      let (inside, outside) = if solid(a) { (a, b) } else { (b, a) };
      outward += self.points[outside as usize] - self.points[inside as usize];
    }

    let mut facing = normal.dot(outward);
    if facing.abs() <= 1e-6 {
      facing = normal.dot(planar_hint);
    }
    if facing < 0.0 {
      edges.reverse();
    }
  }
}
