//! Min/max density summary used to skip uniform regions.

/// Running min/max of densities relative to a threshold.
///
/// A range is skippable when every encapsulated density lies on the same side
/// of the threshold: the region is uniformly solid or uniformly empty and
/// produces no geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DensityRange {
  min: u8,
  max: u8,
  threshold: u8,
}

impl DensityRange {
  /// Empty range (skippable until something is encapsulated).
  pub const fn new(threshold: u8) -> Self {
    Self {
      min: u8::MAX,
      max: u8::MIN,
      threshold,
    }
  }

  /// Range covering every density in `densities`.
  pub fn from_densities(threshold: u8, densities: impl IntoIterator<Item = u8>) -> Self {
    let mut range = Self::new(threshold);
    for density in densities {
      range.encapsulate(density);
    }
    range
  }

  #[inline]
  pub fn encapsulate(&mut self, density: u8) {
    self.min = self.min.min(density);
    self.max = self.max.max(density);
  }

  /// Merge another range with the same threshold.
  #[inline]
  pub fn merge(&mut self, other: &DensityRange) {
    debug_assert_eq!(self.threshold, other.threshold);
    self.min = self.min.min(other.min);
    self.max = self.max.max(other.max);
  }

  #[inline]
  pub fn merged(mut self, other: DensityRange) -> Self {
    self.merge(&other);
    self
  }

  #[inline]
  pub fn is_skippable(&self) -> bool {
    self.min >= self.threshold || self.max < self.threshold
  }

  /// True when nothing has been encapsulated yet.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.min > self.max
  }

  #[inline]
  pub fn min(&self) -> u8 {
    self.min
  }

  #[inline]
  pub fn max(&self) -> u8 {
    self.max
  }

  #[inline]
  pub fn threshold(&self) -> u8 {
    self.threshold
  }
}

#[cfg(test)]
#[path = "density_range_test.rs"]
mod density_range_test;
