//! Marching cubes lookup tables for regular and transition cells.
//!
//! Both tables are generated once per process from cell topology (see
//! [`contour`]) and shared read-only by every extraction job.

mod contour;
mod regular;
mod transition;

pub use regular::{
  regular_edge_code, regular_tables, RegularCellClass, RegularTables, REGULAR_CORNERS, REGULAR_EDGES,
};
pub use transition::{
  transition_point_position, transition_sample_source, transition_tables, TransitionCellClass,
  TransitionTables, TRANSITION_POINTS, TRANSITION_WINDING_FLIP,
};

/// Direction nibble value marking an edge owned by the current cell.
pub const EDGE_OWNED: u8 = 0x8;

#[inline(always)]
pub fn edge_direction(code: u16) -> u8 {
  (code >> 12) as u8
}

#[inline(always)]
pub fn edge_slot(code: u16) -> usize {
  ((code >> 8) & 0xF) as usize
}

#[inline(always)]
pub fn edge_point0(code: u16) -> u8 {
  ((code >> 4) & 0xF) as u8
}

#[inline(always)]
pub fn edge_point1(code: u16) -> u8 {
  (code & 0xF) as u8
}
