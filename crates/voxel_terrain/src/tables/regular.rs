//! Regular cell tables.
//!
//! # Cube Topology
//!
//! ```text
//!       6──────7         Corners (binary ZYX):
//!      /│     /│           0=(0,0,0)  1=(1,0,0)  2=(0,1,0)  3=(1,1,0)
//!     4─┼────5 │           4=(0,0,1)  5=(1,0,1)  6=(0,1,1)  7=(1,1,1)
//!     │ 2────┼─3
//!     │/     │/          +Y
//!     0──────1            │  +Z
//!                         │ /
//!                         └───+X
//! ```
//!
//! # Vertex Codes
//!
//! Each crossing edge of a case is described by a 16-bit code:
//!
//! ```text
//!   15   12 11    8 7     4 3     0
//!   ┌──────┬───────┬───────┬───────┐
//!   │ dir  │ slot  │  c0   │  c1   │
//!   └──────┴───────┴───────┴───────┘
//! ```
//!
//! `dir` bits 0/1/2 name the −X/−Y/−Z neighbour cube that owns the edge;
//! `0x8` means this cube owns it. Every cube owns the three edges meeting at
//! corner 7 (3-7, 5-7, 6-7) and stores their vertices at `slot` = axis + 1.

use std::collections::HashMap;
use std::sync::LazyLock;

use glam::{IVec3, Vec3};
use smallvec::SmallVec;

use super::contour::CellTopology;
use super::EDGE_OWNED;

/// Corner offsets in the unit cube.
pub const REGULAR_CORNERS: [IVec3; 8] = [
  IVec3::new(0, 0, 0),
  IVec3::new(1, 0, 0),
  IVec3::new(0, 1, 0),
  IVec3::new(1, 1, 0),
  IVec3::new(0, 0, 1),
  IVec3::new(1, 0, 1),
  IVec3::new(0, 1, 1),
  IVec3::new(1, 1, 1),
];

/// Edge endpoint corner indices.
pub const REGULAR_EDGES: [[u8; 2]; 12] = [
  [0, 1], // Edge 0:  X axis at Y=0, Z=0
  [0, 2], // Edge 1:  Y axis at X=0, Z=0
  [0, 4], // Edge 2:  Z axis at X=0, Y=0
  [1, 3], // Edge 3:  Y axis at X=1, Z=0
  [1, 5], // Edge 4:  Z axis at X=1, Y=0
  [2, 3], // Edge 5:  X axis at Y=1, Z=0
  [2, 6], // Edge 6:  Z axis at X=0, Y=1
  [3, 7], // Edge 7:  Z axis at X=1, Y=1
  [4, 5], // Edge 8:  X axis at Y=0, Z=1
  [4, 6], // Edge 9:  Y axis at X=0, Z=1
  [5, 7], // Edge 10: Y axis at X=1, Z=1
  [6, 7], // Edge 11: X axis at Y=1, Z=1
];

/// Corner cycles of the six cube faces (−X, +X, −Y, +Y, −Z, +Z).
const CUBE_FACES: [[u8; 4]; 6] = [
  [0, 2, 6, 4],
  [1, 3, 7, 5],
  [0, 1, 5, 4],
  [2, 3, 7, 6],
  [0, 1, 3, 2],
  [4, 5, 7, 6],
];

/// Triangulation shared by every case with the same topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegularCellClass {
  vertex_count: u8,
  indices: SmallVec<[u8; 36]>,
}

impl RegularCellClass {
  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.vertex_count as usize
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Local vertex indices, three per triangle.
  #[inline]
  pub fn indices(&self) -> &[u8] {
    &self.indices
  }
}

/// Case → class and per-case vertex codes.
#[derive(Debug)]
pub struct RegularTables {
  classes: Vec<RegularCellClass>,
  case_class: [u8; 256],
  vertex_codes: Vec<SmallVec<[u16; 12]>>,
}

impl RegularTables {
  #[inline]
  pub fn class_of(&self, case: u8) -> &RegularCellClass {
    &self.classes[self.case_class[case as usize] as usize]
  }

  #[inline]
  pub fn class_index(&self, case: u8) -> u8 {
    self.case_class[case as usize]
  }

  #[inline]
  pub fn vertex_codes(&self, case: u8) -> &[u16] {
    &self.vertex_codes[case as usize]
  }

  #[inline]
  pub fn class_count(&self) -> usize {
    self.classes.len()
  }
}

static REGULAR_TABLES: LazyLock<RegularTables> = LazyLock::new(build_regular_tables);

/// Process-wide regular cell tables, built on first use.
#[inline]
pub fn regular_tables() -> &'static RegularTables {
  &REGULAR_TABLES
}

/// Vertex code for the cube edge between corners `c0` and `c1`.
pub fn regular_edge_code(c0: u8, c1: u8) -> u16 {
  let axis = (c0 ^ c1).trailing_zeros();
  let mut dir = 0u16;
  for other in (0..3).filter(|&a| a != axis) {
    if c0 & (1 << other) == 0 {
      dir |= 1 << other;
    }
  }
  if dir == 0 {
    dir = EDGE_OWNED as u16;
  }
  let slot = axis as u16 + 1;
  dir << 12 | slot << 8 | (c0 as u16) << 4 | c1 as u16
}

fn build_regular_tables() -> RegularTables {
  let points: Vec<Vec3> = REGULAR_CORNERS.iter().map(|c| c.as_vec3()).collect();
  let faces: Vec<&[u8]> = CUBE_FACES.iter().map(|f| &f[..]).collect();
  let topology = CellTopology {
    points: &points,
    edges: &REGULAR_EDGES,
    faces: &faces,
  };

  let mut classes: Vec<RegularCellClass> = Vec::new();
  let mut lookup: HashMap<(u8, SmallVec<[u8; 36]>), u8> = HashMap::new();
  let mut case_class = [0u8; 256];
  let mut vertex_codes = Vec::with_capacity(256);

  for case in 0..256usize {
    let contour = topology.contour(|c| case & (1 << c) != 0, Vec3::ZERO);
    let indices: SmallVec<[u8; 36]> = contour.triangles.iter().flatten().copied().collect();
    let vertex_count = contour.vertex_edges.len() as u8;

    let class = *lookup.entry((vertex_count, indices.clone())).or_insert_with(|| {
      classes.push(RegularCellClass {
        vertex_count,
        indices,
      });
      (classes.len() - 1) as u8
    });
    case_class[case] = class;

    vertex_codes.push(
      contour
        .vertex_edges
        .iter()
        .map(|&e| {
          let [c0, c1] = REGULAR_EDGES[e as usize];
          regular_edge_code(c0, c1)
        })
        .collect(),
    );
  }

  RegularTables {
    classes,
    case_class,
    vertex_codes,
  }
}

#[cfg(test)]
#[path = "regular_test.rs"]
mod regular_test;
