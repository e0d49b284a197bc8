//! Run-length encoded voxel storage.
//!
//! A chunk rests in sparse form between edits. The dense padded buffer is
//! scanned in index order and consecutive equal voxels collapse into a
//! [`SparseRun`]:
//!
//! ```text
//!   dense:  A A A A B B C C C C C A A
//!   runs:   (A,0) (B,4) (C,6) (A,11)
//! ```
//!
//! Both directions work one deck (`data_area_size` samples, one Z slab) at a
//! time so the decks can be processed in parallel. Packing stitches deck
//! results together, merging runs that continue across a deck seam. Unpacking
//! locates each deck's first run with a binary search and fills forward.

use rayon::prelude::*;

use super::{DensityRange, VoxelBuffer};
use crate::config::ChunkConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::types::VoxelData;

/// One run of identical voxels starting at `start_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparseRun {
  pub voxel: VoxelData,
  pub start_index: u32,
}

impl SparseRun {
  #[inline]
  pub const fn new(voxel: VoxelData, start_index: u32) -> Self {
    Self { voxel, start_index }
  }
}

// =============================================================================
// Pack / unpack
// =============================================================================

/// Compress a dense slice into runs.
///
/// `deck_size` is the parallel work unit; any positive value yields the same
/// runs.
pub fn pack(dense: &[VoxelData], deck_size: usize) -> TerrainResult<Vec<SparseRun>> {
  if dense.is_empty() {
    return Err(TerrainError::EmptyBuffer);
  }
  let deck_size = deck_size.max(1);

  let decks: Vec<Vec<SparseRun>> = dense
    .par_chunks(deck_size)
    .enumerate()
    .map(|(deck, voxels)| pack_deck(voxels, deck * deck_size))
    .collect();

  let mut runs: Vec<SparseRun> = Vec::with_capacity(decks.iter().map(Vec::len).sum());
  for deck in decks {
    for run in deck {
      match runs.last() {
        Some(last) if last.voxel == run.voxel => {}
        _ => runs.push(run),
      }
    }
  }
  Ok(runs)
}

fn pack_deck(voxels: &[VoxelData], base: usize) -> Vec<SparseRun> {
  let mut runs = Vec::new();
  let mut current: Option<VoxelData> = None;
  for (i, &voxel) in voxels.iter().enumerate() {
    if current != Some(voxel) {
      runs.push(SparseRun::new(voxel, (base + i) as u32));
      current = Some(voxel);
    }
  }
  runs
}

/// Index of the run whose `[start_index, next_start)` contains `index`.
#[inline]
fn find_run(runs: &[SparseRun], index: usize) -> usize {
  runs
    .partition_point(|run| run.start_index as usize <= index)
    .saturating_sub(1)
}

/// Expand `runs` into `target`, returning the density range of the data.
///
/// `target` must be sized for `config`; runs must satisfy the store invariant.
pub fn unpack(runs: &[SparseRun], target: &mut VoxelBuffer, config: &ChunkConfig) -> DensityRange {
  let threshold = config.density_threshold();
  let deck_size = config.data_area_size() as usize;
  if runs.is_empty() {
    return DensityRange::new(threshold);
  }

  target
    .as_mut_slice()
    .par_chunks_mut(deck_size)
    .enumerate()
    .map(|(deck, voxels)| {
      let deck_start = deck * deck_size;
      let mut range = DensityRange::new(threshold);
      let mut run = find_run(runs, deck_start);
      let mut pos = 0;
      while pos < voxels.len() {
        let run_end = runs
          .get(run + 1)
          .map_or(usize::MAX, |next| next.start_index as usize);
        let end = run_end.saturating_sub(deck_start).min(voxels.len());
        let voxel = runs[run].voxel;
        voxels[pos..end].fill(voxel);
        range.encapsulate(voxel.density);
        pos = end;
        run += 1;
      }
      range
    })
    .reduce(|| DensityRange::new(threshold), DensityRange::merged)
}

/// Check the run invariant against a volume of `volume_size` voxels.
pub fn validate_runs(runs: &[SparseRun], volume_size: usize) -> bool {
  let Some(first) = runs.first() else {
    return false;
  };
  if first.start_index != 0 {
    return false;
  }
  let ordered = runs
    .windows(2)
    .all(|w| w[0].start_index < w[1].start_index && w[0].voxel != w[1].voxel);
  let last = runs[runs.len() - 1].start_index as usize;
  ordered && last < volume_size
}

// =============================================================================
// Store
// =============================================================================

/// The resting, compressed state of a chunk's voxel data.
#[derive(Clone, Debug, Default)]
pub struct SparseVoxelStore {
  runs: Vec<SparseRun>,
}

impl SparseVoxelStore {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn is_populated(&self) -> bool {
    !self.runs.is_empty()
  }

  /// Seed the store. Fails when the store already holds data.
  pub fn initialize(&mut self, runs: Vec<SparseRun>) -> TerrainResult<()> {
    if self.is_populated() {
      return Err(TerrainError::StoreAlreadyPopulated);
    }
    if runs.is_empty() {
      return Err(TerrainError::EmptyBuffer);
    }
    self.runs = runs;
    Ok(())
  }

  /// Pack `buffer` and seed the store with it.
  pub fn initialize_from(&mut self, buffer: &VoxelBuffer, config: &ChunkConfig) -> TerrainResult<()> {
    if self.is_populated() {
      return Err(TerrainError::StoreAlreadyPopulated);
    }
    let runs = pack(buffer.as_slice(), config.data_area_size() as usize)?;
    self.initialize(runs)
  }

  /// Swap in freshly packed runs after an edit.
  pub fn replace(&mut self, runs: Vec<SparseRun>) {
    self.runs = runs;
  }

  /// Free the runs.
  pub fn release(&mut self) {
    self.runs = Vec::new();
  }

  #[inline]
  pub fn runs(&self) -> &[SparseRun] {
    &self.runs
  }

  #[inline]
  pub fn run_count(&self) -> usize {
    self.runs.len()
  }

  /// Voxel at a padded data index without decompressing.
  pub fn query_at(&self, index: usize) -> Option<VoxelData> {
    if self.runs.is_empty() {
      return None;
    }
    Some(self.runs[find_run(&self.runs, index)].voxel)
  }

  /// Decompress into `target`.
  pub fn unpack_into(&self, target: &mut VoxelBuffer, config: &ChunkConfig) -> TerrainResult<DensityRange> {
    if !self.is_populated() {
      return Err(TerrainError::StoreEmpty);
    }
    let expected = config.data_volume_size() as usize;
    if target.len() != expected {
      return Err(TerrainError::BufferSizeMismatch {
        expected,
        actual: target.len(),
      });
    }
    Ok(unpack(&self.runs, target, config))
  }

  /// True when the runs satisfy the store invariant for `config`.
  pub fn validate(&self, config: &ChunkConfig) -> bool {
    validate_runs(&self.runs, config.data_volume_size() as usize)
  }

  /// Dense samples per stored run.
  pub fn compression_ratio(&self, config: &ChunkConfig) -> f32 {
    if self.runs.is_empty() {
      return 0.0;
    }
    config.data_volume_size() as f32 / self.runs.len() as f32
  }
}

#[cfg(test)]
#[path = "sparse_test.rs"]
mod sparse_test;
