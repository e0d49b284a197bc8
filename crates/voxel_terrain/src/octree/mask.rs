//! Leaf faces and transition masks.
//!
//! ```text
//!   bit   0    1    2    3    4    5
//!   face  -X   -Y   -Z   +X   +Y   +Z
//! ```
//!
//! A set bit means the neighbour across that face is one LOD finer and the
//! leaf renders its seam geometry there. Opposite faces are three bits apart.

use glam::IVec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
  NegX,
  NegY,
  NegZ,
  PosX,
  PosY,
  PosZ,
}

impl Face {
  pub const ALL: [Face; 6] = [Face::NegX, Face::NegY, Face::NegZ, Face::PosX, Face::PosY, Face::PosZ];

  #[inline]
  pub const fn index(self) -> usize {
    self as usize
  }

  #[inline]
  pub const fn from_index(index: usize) -> Face {
    Self::ALL[index % 6]
  }

  /// 0 = X, 1 = Y, 2 = Z.
  #[inline]
  pub const fn axis(self) -> usize {
    self.index() % 3
  }

  #[inline]
  pub const fn is_positive(self) -> bool {
    self.index() >= 3
  }

  #[inline]
  pub const fn opposite(self) -> Face {
    Self::from_index(self.index() + 3)
  }

  /// Unit step out of the face.
  #[inline]
  pub fn direction(self) -> IVec3 {
    let mut dir = IVec3::ZERO;
    dir[self.axis()] = if self.is_positive() { 1 } else { -1 };
    dir
  }

  #[inline]
  pub const fn bit(self) -> u8 {
    1 << self.index()
  }
}

/// Six-bit set of faces needing seam geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TransitionMask(u8);

impl TransitionMask {
  pub const NONE: Self = Self(0);
  pub const ALL: Self = Self(0b11_1111);

  #[inline]
  pub const fn from_bits(bits: u8) -> Self {
    Self(bits & 0b11_1111)
  }

  #[inline]
  pub const fn bits(self) -> u8 {
    self.0
  }

  #[inline]
  pub const fn contains(self, face: Face) -> bool {
    self.0 & face.bit() != 0
  }

  /// Set or clear one face. Returns whether the mask changed.
  #[inline]
  pub fn set(&mut self, face: Face, on: bool) -> bool {
    let before = self.0;
    if on {
      self.0 |= face.bit();
    } else {
      self.0 &= !face.bit();
    }
    before != self.0
  }

  #[inline]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }
}

/// Seam bits for two face-adjacent leaves: `(leaf side, neighbour side)`.
///
/// Only the coarser of two leaves renders a seam; equal LODs need none.
#[inline]
pub const fn seam_flags(lod: u8, neighbor_lod: u8) -> (bool, bool) {
  (lod > neighbor_lod, neighbor_lod > lod)
}

#[cfg(test)]
#[path = "mask_test.rs"]
mod mask_test;
