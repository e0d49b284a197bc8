//! Chunk - one `chunk_size³` block of the volume.
//!
//! A chunk rests in sparse form. Dense data only exists while the chunk holds
//! a lease from the [`DenseBufferPool`]: during initialization, extraction
//! and edits.
//!
//! ```text
//!   ┌───────────────────────── BaseChunk ─────────────────────────┐
//!   │  SparseVoxelStore   DensityRange   VoxelOverrides   Octree  │
//!   └─────────────────────────────────────────────────────────────┘
//!              ▲ composed by every Chunk implementation
//! ```
//!
//! Custom chunk types implement [`Chunk`] by exposing a `BaseChunk`; every
//! other method has a default that delegates to it.

use glam::IVec3;

use crate::config::ChunkConfig;
use crate::error::{TerrainError, TerrainResult};
use crate::octree::{LeafKey, LodChanges, LodContext, OctreeNode, VoxelBounds};
use crate::presentation::MeshHandle;
use crate::source::{ContentSource, OverrideSource};
use crate::storage::{DenseBufferPool, DenseLease, DensityRange, SparseVoxelStore, VoxelOverrides};
use crate::types::{VoxelData, VoxelEdit};

// =============================================================================
// BaseChunk
// =============================================================================

/// Data and octree shared by every chunk implementation.
#[derive(Debug)]
pub struct BaseChunk {
  coord: IVec3,
  store: SparseVoxelStore,
  density_range: DensityRange,
  overrides: VoxelOverrides,
  root: OctreeNode,
  initialized: bool,
}

impl BaseChunk {
  pub fn new(coord: IVec3, config: &ChunkConfig) -> Self {
    Self {
      coord,
      store: SparseVoxelStore::new(),
      density_range: DensityRange::new(config.density_threshold()),
      overrides: VoxelOverrides::new(),
      root: OctreeNode::root(config),
      initialized: false,
    }
  }

  #[inline]
  pub fn coord(&self) -> IVec3 {
    self.coord
  }

  #[inline]
  pub fn is_initialized(&self) -> bool {
    self.initialized
  }

  #[inline]
  pub fn store(&self) -> &SparseVoxelStore {
    &self.store
  }

  #[inline]
  pub fn density_range(&self) -> DensityRange {
    self.density_range
  }

  #[inline]
  pub fn overrides(&self) -> &VoxelOverrides {
    &self.overrides
  }

  #[inline]
  pub fn octree(&self) -> &OctreeNode {
    &self.root
  }

  #[inline]
  pub fn octree_mut(&mut self) -> &mut OctreeNode {
    &mut self.root
  }

  /// Fill from `content`, pin overrides and pack. Runs once per chunk.
  pub fn initialize(
    &mut self,
    config: &ChunkConfig,
    content: &dyn ContentSource,
    overrides: &dyn OverrideSource,
    pool: &mut DenseBufferPool,
  ) -> TerrainResult<()> {
    if self.initialized {
      return Err(TerrainError::ChunkAlreadyInitialized(self.coord));
    }

    let mut lease = pool.checkout(self.coord, config)?;
    let filled = lease.buffer_mut().map(|buffer| {
      content.fill_data_array(self.coord, config, buffer);
      let rules = overrides.build_chunk_overrides(self.coord, config);
      let pinned = rules.apply(buffer, config);
      let range = DensityRange::from_densities(
        config.density_threshold(),
        buffer.as_slice().iter().map(|v| v.density),
      );
      (rules, range, pinned)
    });

    let (rules, range, pinned) = match filled {
      Ok(filled) => filled,
      Err(err) => {
        self.return_lease(pool, lease, config);
        return Err(err);
      }
    };

    lease.mark_dirty();
    self.return_lease(pool, lease, config);
    if !self.store.is_populated() {
      return Err(TerrainError::StoreEmpty);
    }

    self.overrides = rules;
    self.density_range = range;
    self.initialized = true;
    tracing::trace!(
      chunk = %self.coord,
      runs = self.store.run_count(),
      pinned,
      skippable = range.is_skippable(),
      "chunk initialized"
    );
    Ok(())
  }

  /// Check out the bucket buffer and decompress into it.
  ///
  /// The density range is recomputed from the unpacked data.
  pub fn checkout(&mut self, config: &ChunkConfig, pool: &mut DenseBufferPool) -> TerrainResult<DenseLease> {
    if !self.initialized {
      return Err(TerrainError::ChunkNotInitialized(self.coord));
    }
    let mut lease = pool.checkout(self.coord, config)?;
    let unpacked = lease
      .buffer_mut()
      .and_then(|buffer| self.store.unpack_into(buffer, config));
    match unpacked {
      Ok(range) => {
        self.density_range = range;
        Ok(lease)
      }
      Err(err) => {
        self.return_lease(pool, lease, config);
        Err(err)
      }
    }
  }

  /// Release a lease, repacking into this chunk's store when dirty.
  pub fn return_lease(&mut self, pool: &mut DenseBufferPool, lease: DenseLease, config: &ChunkConfig) {
    if let Err((err, lease)) = pool.release(lease, &mut self.store, config) {
      tracing::warn!(chunk = %self.coord, %err, "dense buffer release failed");
      // Held by jobs that were never joined; the bucket stays checked out.
      drop(lease);
    }
  }

  /// Current voxel at a chunk-local position, read from sparse form.
  pub fn query_voxel(&self, config: &ChunkConfig, local: IVec3) -> Option<VoxelData> {
    config.voxel_index(local).and_then(|index| self.store.query_at(index))
  }

  #[inline]
  pub fn is_pinned(&self, local: IVec3) -> bool {
    self.overrides.is_pinned(local)
  }

  /// Rebuild leaves for the viewer. Skippable chunks hold no leaves.
  pub fn validate_lods(&mut self, ctx: &LodContext, out: &mut LodChanges) {
    if !self.initialized || self.density_range.is_skippable() {
      self.root.dispose(&mut out.released);
      return;
    }
    self.root.validate_lods(ctx, out);
  }

  /// Write `edits` into the dense buffer, skipping unchanged voxels.
  ///
  /// Returns the chunk-local bounds of every changed voxel, or `None` when
  /// nothing changed. Changed data is repacked before returning.
  pub fn apply_voxel_edits(
    &mut self,
    edits: &[VoxelEdit],
    config: &ChunkConfig,
    pool: &mut DenseBufferPool,
  ) -> TerrainResult<Option<VoxelBounds>> {
    if edits.is_empty() {
      return Ok(None);
    }
    let mut lease = self.checkout(config, pool)?;
    let mut bounds: Option<VoxelBounds> = None;
    let mut range = self.density_range;

    let written = lease.buffer_mut().map(|buffer| {
      let volume = buffer.len();
      for edit in edits {
        if edit.index >= volume || buffer.get(edit.index) == edit.voxel() {
          continue;
        }
        buffer.set(edit.index, edit.voxel());
        range.encapsulate(edit.density);
        let local = config.voxel_position(edit.index);
        match bounds.as_mut() {
          Some(b) => b.include(local),
          None => bounds = Some(VoxelBounds::from_point(local)),
        }
      }
    });

    if bounds.is_some() {
      lease.mark_dirty();
    }
    self.return_lease(pool, lease, config);
    written?;

    self.density_range = range;
    Ok(bounds)
  }

  /// Flag leaves touching `edited` (grown by `skirt`) for re-extraction.
  pub fn validate_edits(&mut self, edited: &VoxelBounds, skirt: i32) -> Vec<LeafKey> {
    let mut touched = Vec::new();
    self.root.validate_edits(self.coord, &edited.expand(skirt), &mut touched);
    touched
  }

  /// Leaves waiting for extraction.
  pub fn pending_extractions(&mut self) -> Vec<LeafKey> {
    let coord = self.coord;
    let mut pending = Vec::new();
    self.root.for_each_leaf_mut(&mut |position, lod, leaf| {
      if leaf.needs_extraction() {
        pending.push(LeafKey {
          chunk: coord,
          position,
          lod,
        });
      }
    });
    pending
  }

  /// Free the store and every leaf mesh.
  pub fn dispose(&mut self, released: &mut Vec<MeshHandle>) {
    self.root.dispose(released);
    self.store.release();
    self.initialized = false;
  }
}

// =============================================================================
// Chunk
// =============================================================================

/// Capability interface of a volume chunk.
///
/// Only construction and access to the composed [`BaseChunk`] are required.
pub trait Chunk: Send {
  fn create(coord: IVec3, config: &ChunkConfig) -> Self
  where
    Self: Sized;

  fn base(&self) -> &BaseChunk;

  fn base_mut(&mut self) -> &mut BaseChunk;

  fn coord(&self) -> IVec3 {
    self.base().coord()
  }

  fn is_initialized(&self) -> bool {
    self.base().is_initialized()
  }

  fn initialize(
    &mut self,
    config: &ChunkConfig,
    content: &dyn ContentSource,
    overrides: &dyn OverrideSource,
    pool: &mut DenseBufferPool,
  ) -> TerrainResult<()> {
    self.base_mut().initialize(config, content, overrides, pool)
  }

  fn query_voxel(&self, config: &ChunkConfig, local: IVec3) -> Option<VoxelData> {
    self.base().query_voxel(config, local)
  }

  fn is_pinned(&self, local: IVec3) -> bool {
    self.base().is_pinned(local)
  }

  fn validate_lods(&mut self, ctx: &LodContext, out: &mut LodChanges) {
    self.base_mut().validate_lods(ctx, out)
  }

  fn apply_voxel_edits(
    &mut self,
    edits: &[VoxelEdit],
    config: &ChunkConfig,
    pool: &mut DenseBufferPool,
  ) -> TerrainResult<Option<VoxelBounds>> {
    self.base_mut().apply_voxel_edits(edits, config, pool)
  }

  fn validate_edits(&mut self, edited: &VoxelBounds, skirt: i32) -> Vec<LeafKey> {
    self.base_mut().validate_edits(edited, skirt)
  }

  fn dispose(&mut self, released: &mut Vec<MeshHandle>) {
    self.base_mut().dispose(released)
  }
}

impl Chunk for BaseChunk {
  fn create(coord: IVec3, config: &ChunkConfig) -> Self {
    BaseChunk::new(coord, config)
  }

  fn base(&self) -> &BaseChunk {
    self
  }

  fn base_mut(&mut self) -> &mut BaseChunk {
    self
  }
}

#[cfg(test)]
#[path = "chunk_test.rs"]
mod chunk_test;
