//! Transition cell tables.
//!
//! A transition cell covers one coarse cube face that borders a leaf one LOD
//! finer. Its front face carries the 3×3 full-resolution samples; the back
//! face repeats the four coarse corners:
//!
//! ```text
//!   front (fine)            back (coarse)
//!
//!   6───7───8               B───────C
//!   │   │   │               │       │
//!   3───4───5               │       │
//!   │   │   │               │       │
//!   0───1───2               9───────A
//!
//!   +v
//!   │         9 = 0, A = 2, B = 6, C = 8
//!   └── +u
//! ```
//!
//! The case code is the 9-bit solid mask of samples 0..8. Vertex codes use the
//! regular layout with face-local directions: `dir` 1 = −u neighbour, 2 = −v
//! neighbour, `0x8` = owned, 0 = never shared (interior edges around 4).
//!
//! Nominal positions place the back face half a cell deep so loops can be
//! oriented; extraction flattens both faces into the leaf face plane.

use std::collections::HashMap;
use std::sync::LazyLock;

use glam::Vec3;
use smallvec::SmallVec;

use super::contour::CellTopology;
use super::EDGE_OWNED;

/// Class flag: the case uses its class with reversed winding.
pub const TRANSITION_WINDING_FLIP: u16 = 0x8000;

/// Face-grid position of each sample point in half-cell units.
pub const TRANSITION_POINTS: [(u8, u8); 13] = [
  (0, 0),
  (1, 0),
  (2, 0),
  (0, 1),
  (1, 1),
  (2, 1),
  (0, 2),
  (1, 2),
  (2, 2),
  (0, 0),
  (2, 0),
  (0, 2),
  (2, 2),
];

/// Fine sample mirrored by each back point (9..=12).
const BACK_SOURCES: [u8; 4] = [0, 2, 6, 8];

/// Edges that may carry a vertex, with their cache direction and slot.
const TRANSITION_EDGES: [([u8; 2], u8, u8); 16] = [
  // front, along u
  ([0, 1], 2, 4),
  ([1, 2], 2, 5),
  ([3, 4], 0, 0),
  ([4, 5], 0, 0),
  ([6, 7], EDGE_OWNED, 4),
  ([7, 8], EDGE_OWNED, 5),
  // front, along v
  ([0, 3], 1, 1),
  ([3, 6], 1, 2),
  ([1, 4], 0, 0),
  ([4, 7], 0, 0),
  ([2, 5], EDGE_OWNED, 1),
  ([5, 8], EDGE_OWNED, 2),
  // back
  ([9, 10], 2, 6),
  ([10, 12], EDGE_OWNED, 3),
  ([11, 12], EDGE_OWNED, 6),
  ([9, 11], 1, 3),
];

const FRONT_FACES: [[u8; 4]; 5] = [
  [0, 1, 4, 3],
  [1, 2, 5, 4],
  [3, 4, 7, 6],
  [4, 5, 8, 7],
  [9, 10, 12, 11],
];

const SIDE_FACES: [[u8; 5]; 4] = [
  [0, 1, 2, 10, 9],
  [2, 5, 8, 12, 10],
  [8, 7, 6, 11, 12],
  [6, 3, 0, 9, 11],
];

/// Nominal position of a sample point (`u`, `v`, depth).
pub fn transition_point_position(point: u8) -> Vec3 {
  let (u, v) = TRANSITION_POINTS[point as usize];
  let depth = if point >= 9 { 0.5 } else { 0.0 };
  Vec3::new(u as f32 * 0.5, v as f32 * 0.5, depth)
}

/// Fine sample whose value a point carries.
#[inline]
pub fn transition_sample_source(point: u8) -> u8 {
  if point >= 9 {
    BACK_SOURCES[(point - 9) as usize]
  } else {
    point
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionCellClass {
  vertex_count: u8,
  indices: SmallVec<[u8; 64]>,
}

impl TransitionCellClass {
  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.vertex_count as usize
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  #[inline]
  pub fn indices(&self) -> &[u8] {
    &self.indices
  }
}

#[derive(Debug)]
pub struct TransitionTables {
  classes: Vec<TransitionCellClass>,
  case_class: Vec<u16>,
  vertex_codes: Vec<SmallVec<[u16; 16]>>,
}

impl TransitionTables {
  /// Class and whether its winding is reversed for `case`.
  #[inline]
  pub fn class_of(&self, case: u16) -> (&TransitionCellClass, bool) {
    let code = self.case_class[case as usize];
    let class = &self.classes[(code & !TRANSITION_WINDING_FLIP) as usize];
    (class, code & TRANSITION_WINDING_FLIP != 0)
  }

  #[inline]
  pub fn class_code(&self, case: u16) -> u16 {
    self.case_class[case as usize]
  }

  #[inline]
  pub fn vertex_codes(&self, case: u16) -> &[u16] {
    &self.vertex_codes[case as usize]
  }

  #[inline]
  pub fn class_count(&self) -> usize {
    self.classes.len()
  }
}

static TRANSITION_TABLES: LazyLock<TransitionTables> = LazyLock::new(build_transition_tables);

/// Process-wide transition cell tables, built on first use.
#[inline]
pub fn transition_tables() -> &'static TransitionTables {
  &TRANSITION_TABLES
}

fn build_transition_tables() -> TransitionTables {
  let points: Vec<Vec3> = (0..13).map(transition_point_position).collect();
  let edges: Vec<[u8; 2]> = TRANSITION_EDGES.iter().map(|(e, _, _)| *e).collect();
  let faces: Vec<&[u8]> = FRONT_FACES
    .iter()
    .map(|f| &f[..])
    .chain(SIDE_FACES.iter().map(|f| &f[..]))
    .collect();
  let topology = CellTopology {
    points: &points,
    edges: &edges,
    faces: &faces,
  };

  let mut classes: Vec<TransitionCellClass> = Vec::new();
  let mut lookup: HashMap<(u8, SmallVec<[u8; 64]>), u16> = HashMap::new();
  let mut case_class = Vec::with_capacity(512);
  let mut vertex_codes = Vec::with_capacity(512);

  for case in 0..512u16 {
    let solid = |p: u8| case & (1 << transition_sample_source(p)) != 0;
    let hint = if solid(4) { Vec3::Z } else { Vec3::NEG_Z };
    let contour = topology.contour(solid, hint);

    let vertex_count = contour.vertex_edges.len() as u8;
    let indices: SmallVec<[u8; 64]> = contour.triangles.iter().flatten().copied().collect();
    let flipped: SmallVec<[u8; 64]> = contour
      .triangles
      .iter()
      .flat_map(|&[a, b, c]| [a, c, b])
      .collect();

    let code = if let Some(&class) = lookup.get(&(vertex_count, indices.clone())) {
      class
    } else if let Some(&class) = lookup.get(&(vertex_count, flipped)) {
      class | TRANSITION_WINDING_FLIP
    } else {
      let class = classes.len() as u16;
      lookup.insert((vertex_count, indices.clone()), class);
      classes.push(TransitionCellClass {
        vertex_count,
        indices,
      });
      class
    };
    case_class.push(code);

    vertex_codes.push(
      contour
        .vertex_edges
        .iter()
        .map(|&e| {
          let ([p0, p1], dir, slot) = TRANSITION_EDGES[e as usize];
          (dir as u16) << 12 | (slot as u16) << 8 | (p0 as u16) << 4 | p1 as u16
        })
        .collect(),
    );
  }

  TransitionTables {
    classes,
    case_class,
    vertex_codes,
  }
}

#[cfg(test)]
#[path = "transition_test.rs"]
mod transition_test;
