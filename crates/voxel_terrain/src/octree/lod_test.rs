use super::*;
use crate::test_utils::config;

#[test]
fn test_default_bands_follow_floor() {
  let config = config(32, 3);
  let ranges = LodRanges::new(&config);
  let d = |lod| node_diagonal(&config, lod);

  assert_eq!(ranges.bands().len(), 3);
  assert!((ranges.bands()[0] - 2.0 * d(0)).abs() < 1e-3);
  assert!((ranges.bands()[1] - (ranges.bands()[0] + 2.0 * d(1))).abs() < 1e-3);
  assert!((ranges.bands()[2] - (ranges.bands()[1] + 2.0 * d(2))).abs() < 1e-3);
}

#[test]
fn test_requested_bands_are_raised_not_lowered() {
  let config = config(32, 3);
  let ranges = LodRanges::from_bands(&config, &[1.0, 5000.0, 1.0], 2.0);
  let floor = LodRanges::new(&config);

  assert_eq!(ranges.bands()[0], floor.bands()[0]);
  assert_eq!(ranges.bands()[1], 5000.0);
  assert!(ranges.bands()[2] >= 5000.0 + 2.0 * node_diagonal(&config, 2));
  assert!(ranges.bands().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_spacing_never_below_minimum() {
  let config = config(32, 3);
  let ranges = LodRanges::from_bands(&config, &[], 0.5);
  assert_eq!(ranges.spacing(), MIN_LOD_SPACING);
  assert_eq!(ranges, LodRanges::new(&config));

  let wide = LodRanges::new(&config).with_spacing(&config, 4.0);
  assert!(wide.bands()[0] > ranges.bands()[0]);
}

#[test]
fn test_target_lod() {
  let config = config(32, 3);
  let ranges = LodRanges::from_bands(&config, &[100.0, 300.0, 900.0], 2.0);
  assert_eq!(ranges.target_lod(0.0), 0);
  assert_eq!(ranges.target_lod(100.0), 0);
  assert_eq!(ranges.target_lod(100.5), 1);
  assert_eq!(ranges.target_lod(900.0), 2);
  assert_eq!(ranges.target_lod(1.0e9), 2);
}
