//! Volume - the chunk registry and per-frame driver.
//!
//! A volume owns every chunk of one terrain plus the shared resources the
//! chunks borrow while they work: config, content sources, the dense buffer
//! pool, the job coordinator and the mesh handle pool. It is also the
//! neighbour lookup for seam masks and edit propagation.
//!
//! ```text
//!   tick(viewer)
//!     1. validate LODs          chunk octrees create / release leaves
//!     2. broadcast seams        new leaves set masks on both sides of a face
//!     3. extract                per chunk: checkout → jobs → complete() → apply
//!     4. flush                  dirty leaves → MeshUpdate::{Upload, Release}
//!
//!   apply_edits(edits)
//!     EditPropagator → per-chunk apply_voxel_edits → validate_edits
//!     (flagged leaves are re-extracted on the next tick)
//! ```
//!
//! Multiple volumes can exist side by side; each gets a [`VolumeId`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glam::{IVec3, Vec3};
use web_time::Instant;

use crate::chunk::{BaseChunk, Chunk};
use crate::config::ChunkConfig;
use crate::edit::{ChunkLookup, EditPropagator, EditRules, WorldEdit};
use crate::error::{TerrainError, TerrainResult};
use crate::extraction::{ExtractionOutput, ExtractionTask};
use crate::jobs::JobCoordinator;
use crate::octree::{seam_flags, Face, LeafKey, LodChanges, LodContext, LodRanges, NodeState};
use crate::presentation::{MeshHandle, MeshHandlePool, MeshUpdate};
use crate::source::{ContentSource, NoOverrides, OverrideSource};
use crate::storage::DenseBufferPool;
use crate::types::VoxelData;

// =============================================================================
// VolumeId
// =============================================================================

static VOLUME_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque volume identifier, unique within the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct VolumeId(u64);

impl VolumeId {
  pub fn new() -> Self {
    Self(VOLUME_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  pub fn raw(&self) -> u64 {
    self.0
  }
}

impl Default for VolumeId {
  fn default() -> Self {
    Self::new()
  }
}

// =============================================================================
// Settings and reports
// =============================================================================

/// Per-volume policy.
#[derive(Clone, Debug)]
pub struct VolumeSettings {
  pub lod_ranges: LodRanges,
  pub edit_rules: EditRules,
  /// Voxels added around an edit's bounds when flagging leaves for remesh.
  pub edit_skirt: i32,
}

impl VolumeSettings {
  pub fn new(config: &ChunkConfig) -> Self {
    Self {
      lod_ranges: LodRanges::new(config),
      edit_rules: EditRules::new(),
      edit_skirt: 1,
    }
  }

  pub fn with_lod_ranges(mut self, lod_ranges: LodRanges) -> Self {
    self.lod_ranges = lod_ranges;
    self
  }

  pub fn with_edit_rules(mut self, edit_rules: EditRules) -> Self {
    self.edit_rules = edit_rules;
    self
  }

  pub fn with_edit_skirt(mut self, edit_skirt: i32) -> Self {
    self.edit_skirt = edit_skirt.max(0);
    self
  }
}

/// Summary of one [`Volume::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickStats {
  pub leaves_created: usize,
  pub handles_released: usize,
  pub tasks_run: usize,
  pub tasks_failed: usize,
  pub uploads: usize,
  pub elapsed: Duration,
}

/// Summary of one [`Volume::apply_edits`].
#[derive(Debug, Default)]
pub struct EditReport {
  pub chunks_changed: usize,
  pub leaves_flagged: usize,
  /// Voxels dropped by pinning or the non-diggable rule.
  pub rejected: usize,
  /// Chunks an edit reached but the registry does not hold.
  pub missing: Vec<IVec3>,
  pub failed: Vec<(IVec3, TerrainError)>,
}

/// Outcome of initializing one chunk.
#[derive(Debug)]
pub struct InitStep {
  pub chunk: IVec3,
  pub result: TerrainResult<()>,
}

// =============================================================================
// Volume
// =============================================================================

pub struct Volume<C: Chunk = BaseChunk> {
  id: VolumeId,
  config: Arc<ChunkConfig>,
  settings: VolumeSettings,
  content: Box<dyn ContentSource>,
  overrides: Box<dyn OverrideSource>,
  chunks: HashMap<IVec3, C>,
  pending_init: VecDeque<IVec3>,
  pool: DenseBufferPool,
  jobs: JobCoordinator<ExtractionOutput>,
  handles: MeshHandlePool,
  dirty: HashSet<LeafKey>,
  updates: Vec<MeshUpdate>,
}

impl<C: Chunk> Volume<C> {
  pub fn new(config: ChunkConfig, content: impl ContentSource + 'static) -> Self {
    let settings = VolumeSettings::new(&config);
    Self {
      id: VolumeId::new(),
      config: Arc::new(config),
      settings,
      content: Box::new(content),
      overrides: Box::new(NoOverrides),
      chunks: HashMap::new(),
      pending_init: VecDeque::new(),
      pool: DenseBufferPool::new(),
      jobs: JobCoordinator::new(),
      handles: MeshHandlePool::new(),
      dirty: HashSet::new(),
      updates: Vec::new(),
    }
  }

  pub fn with_overrides(mut self, overrides: impl OverrideSource + 'static) -> Self {
    self.overrides = Box::new(overrides);
    self
  }

  pub fn with_settings(mut self, settings: VolumeSettings) -> Self {
    self.settings = settings;
    self
  }

  #[inline]
  pub fn id(&self) -> VolumeId {
    self.id
  }

  #[inline]
  pub fn config(&self) -> &Arc<ChunkConfig> {
    &self.config
  }

  #[inline]
  pub fn settings(&self) -> &VolumeSettings {
    &self.settings
  }

  #[inline]
  pub fn mesh_handles(&self) -> &MeshHandlePool {
    &self.handles
  }

  // ---------------------------------------------------------------------------
  // Registry
  // ---------------------------------------------------------------------------

  /// Register a chunk and queue it for initialization.
  ///
  /// Returns `false` when the coordinate is already registered.
  pub fn add_chunk(&mut self, coord: IVec3) -> bool {
    if self.chunks.contains_key(&coord) {
      return false;
    }
    self.chunks.insert(coord, C::create(coord, &self.config));
    self.pending_init.push_back(coord);
    true
  }

  /// Register every chunk in the inclusive range `min..=max`.
  pub fn add_chunks(&mut self, min: IVec3, max: IVec3) -> usize {
    let mut added = 0;
    for z in min.z..=max.z {
      for y in min.y..=max.y {
        for x in min.x..=max.x {
          added += usize::from(self.add_chunk(IVec3::new(x, y, z)));
        }
      }
    }
    added
  }

  /// Dispose and drop a chunk. Its meshes are released and neighbouring
  /// seams facing it are cleared.
  pub fn remove_chunk(&mut self, coord: IVec3) -> bool {
    let Some(mut chunk) = self.chunks.remove(&coord) else {
      return false;
    };
    self.pending_init.retain(|c| *c != coord);
    let mut released = Vec::new();
    chunk.dispose(&mut released);
    self.release_handles(released);
    self.rebroadcast_around(coord);
    true
  }

  pub fn chunk(&self, coord: IVec3) -> Option<&C> {
    self.chunks.get(&coord)
  }

  pub fn chunk_mut(&mut self, coord: IVec3) -> Option<&mut C> {
    self.chunks.get_mut(&coord)
  }

  #[inline]
  pub fn chunk_count(&self) -> usize {
    self.chunks.len()
  }

  /// Current voxel at a global voxel position, read from its primary chunk.
  pub fn voxel_at(&self, global: IVec3) -> TerrainResult<VoxelData> {
    let coord = self.config.chunk_of_voxel(global);
    let chunk = self.chunks.get(&coord).ok_or(TerrainError::MissingChunk(coord))?;
    if !chunk.is_initialized() {
      return Err(TerrainError::ChunkNotInitialized(coord));
    }
    chunk
      .query_voxel(&self.config, global - self.config.chunk_origin(coord))
      .ok_or(TerrainError::StoreEmpty)
  }

  /// Chunks registered but not yet initialized.
  #[inline]
  pub fn pending_init_count(&self) -> usize {
    self.pending_init.len()
  }

  // ---------------------------------------------------------------------------
  // Initialization
  // ---------------------------------------------------------------------------

  /// Lazily initialize pending chunks, one per `next()`.
  ///
  /// Dropping the iterator early leaves the rest queued; a later call picks
  /// up where it stopped.
  pub fn init_steps(&mut self) -> InitSteps<'_, C> {
    InitSteps { volume: self }
  }

  /// Initialize every pending chunk. Returns how many succeeded.
  pub fn initialize_pending(&mut self) -> usize {
    self.init_steps().filter(|step| step.result.is_ok()).count()
  }

  fn init_next(&mut self) -> Option<InitStep> {
    loop {
      let coord = self.pending_init.pop_front()?;
      let Some(chunk) = self.chunks.get_mut(&coord) else {
        continue;
      };
      let result = chunk.initialize(
        &self.config,
        self.content.as_ref(),
        self.overrides.as_ref(),
        &mut self.pool,
      );
      if let Err(err) = &result {
        tracing::warn!(volume = self.id.raw(), chunk = %coord, %err, "chunk initialization failed");
      }
      return Some(InitStep { chunk: coord, result });
    }
  }

  // ---------------------------------------------------------------------------
  // Tick
  // ---------------------------------------------------------------------------

  /// Bring every chunk up to date for `viewer` (world units).
  #[tracing::instrument(skip_all, fields(volume = self.id.raw()))]
  pub fn tick(&mut self, viewer: Vec3) -> TickStats {
    let start = Instant::now();
    let mut stats = TickStats::default();

    // LOD validation.
    let mut changes = LodChanges::default();
    let mut emptied = Vec::new();
    for (coord, chunk) in self.chunks.iter_mut() {
      let had_leaves = has_leaves(chunk);
      let ctx = LodContext {
        chunk: *coord,
        config: &self.config,
        ranges: &self.settings.lod_ranges,
        viewer,
      };
      chunk.validate_lods(&ctx, &mut changes);
      if had_leaves && !has_leaves(chunk) {
        emptied.push(*coord);
      }
    }
    stats.leaves_created = changes.created.len();
    stats.handles_released = changes.released.len();
    self.release_handles(changes.released);

    // Seams.
    for key in &changes.created {
      self.broadcast(*key);
    }
    for coord in emptied {
      self.rebroadcast_around(coord);
    }

    let (run, failed) = self.extract_pending();
    stats.tasks_run = run;
    stats.tasks_failed = failed;
    stats.uploads = self.flush();
    stats.elapsed = start.elapsed();

    tracing::debug!(
      created = stats.leaves_created,
      released = stats.handles_released,
      tasks = stats.tasks_run,
      failed = stats.tasks_failed,
      uploads = stats.uploads,
      elapsed_us = stats.elapsed.as_micros() as u64,
      "volume tick"
    );
    stats
  }

  /// Run extraction for every leaf that asked for it.
  ///
  /// Chunks are processed one at a time: each holds the dense buffer of its
  /// bucket until its jobs are joined.
  fn extract_pending(&mut self) -> (usize, usize) {
    let mut run = 0;
    let mut failed = 0;
    let coords: Vec<IVec3> = self.chunks.keys().copied().collect();

    for coord in coords {
      let Some(chunk) = self.chunks.get_mut(&coord) else {
        continue;
      };
      let pending = chunk.base_mut().pending_extractions();
      if pending.is_empty() {
        continue;
      }

      let lease = match chunk.base_mut().checkout(&self.config, &mut self.pool) {
        Ok(lease) => lease,
        Err(err) => {
          tracing::warn!(chunk = %coord, %err, "extraction skipped");
          continue;
        }
      };

      let buffer = lease.shared();
      let mut tasks: HashMap<u64, ExtractionTask> = HashMap::new();
      for key in pending {
        for task in ExtractionTask::for_leaf(key) {
          let buffer = Arc::clone(&buffer);
          let config = Arc::clone(&self.config);
          let id = self.jobs.schedule(move || task.run(&buffer, &config));
          tasks.insert(id.raw(), task);
        }
      }
      drop(buffer);

      let batch = self.jobs.complete();
      run += batch.len();
      failed += batch.failed.len();
      for (id, output) in batch.completed {
        let Some(task) = tasks.get(&id.raw()) else {
          continue;
        };
        let Some(leaf) = chunk
          .base_mut()
          .octree_mut()
          .leaf_mut(task.leaf.position, task.leaf.lod)
        else {
          tracing::trace!(leaf = ?task.leaf, "extracted leaf no longer exists");
          continue;
        };
        match output {
          ExtractionOutput::Regular(mesh) => leaf.apply_regular(mesh),
          ExtractionOutput::Transition(mesh) => leaf.apply_transition(mesh),
        }
        self.dirty.insert(task.leaf);
      }

      chunk.base_mut().return_lease(&mut self.pool, lease, &self.config);
    }
    (run, failed)
  }

  /// Compose every dirty leaf and queue what changed.
  fn flush(&mut self) -> usize {
    let Self {
      chunks,
      handles,
      dirty,
      updates,
      ..
    } = self;
    let mut uploads = 0;

    dirty.retain(|key| {
      let Some(leaf) = chunks
        .get_mut(&key.chunk)
        .and_then(|chunk| chunk.base_mut().octree_mut().leaf_mut(key.position, key.lod))
      else {
        return false;
      };
      if leaf.needs_extraction() {
        // Composed once its meshes exist.
        return true;
      }
      if !leaf.is_dirty() {
        return false;
      }

      let (vertices, indices) = leaf.compose();
      if indices.is_empty() {
        if let Some(handle) = leaf.set_handle(None) {
          handles.release(handle);
          updates.push(MeshUpdate::Release { handle });
        }
        return false;
      }

      let handle = match leaf.handle() {
        Some(handle) => handle,
        None => {
          let handle = handles.acquire(key.lod);
          leaf.set_handle(Some(handle));
          handle
        }
      };
      updates.push(MeshUpdate::Upload {
        handle,
        chunk: key.chunk,
        lod: key.lod,
        vertices,
        indices,
      });
      uploads += 1;
      false
    });
    uploads
  }

  fn release_handles(&mut self, released: Vec<MeshHandle>) {
    for handle in released {
      self.handles.release(handle);
      self.updates.push(MeshUpdate::Release { handle });
    }
  }

  // ---------------------------------------------------------------------------
  // Seams
  // ---------------------------------------------------------------------------

  /// Resolve the seam bits between `key` and every leaf across its faces.
  fn broadcast(&mut self, key: LeafKey) {
    for face in Face::ALL {
      let mut neighbours: Vec<LeafKey> = Vec::with_capacity(4);
      for (coord, probe) in key.face_probes(face, &self.config) {
        let found = self
          .chunks
          .get(&coord)
          .and_then(|chunk| chunk.base().octree().leaf_at(probe))
          .map(|node| node.key(coord));
        if let Some(neighbour) = found {
          if !neighbours.contains(&neighbour) {
            neighbours.push(neighbour);
          }
        }
      }

      if neighbours.is_empty() {
        self.set_seam(key, face, false);
        continue;
      }
      for neighbour in neighbours {
        let (mine, theirs) = seam_flags(key.lod, neighbour.lod);
        self.set_seam(key, face, mine);
        self.set_seam(neighbour, face.opposite(), theirs);
      }
    }
  }

  /// Re-resolve the seams of every leaf in the six chunks around `coord`.
  fn rebroadcast_around(&mut self, coord: IVec3) {
    for face in Face::ALL {
      let neighbour = coord + face.direction();
      let Some(chunk) = self.chunks.get(&neighbour) else {
        continue;
      };
      let keys: Vec<LeafKey> = chunk
        .base()
        .octree()
        .leaves()
        .into_iter()
        .map(|(position, lod)| LeafKey {
          chunk: neighbour,
          position,
          lod,
        })
        .collect();
      for key in keys {
        self.broadcast(key);
      }
    }
  }

  fn set_seam(&mut self, key: LeafKey, face: Face, on: bool) {
    let leaf = self
      .chunks
      .get_mut(&key.chunk)
      .and_then(|chunk| chunk.base_mut().octree_mut().leaf_mut(key.position, key.lod));
    if let Some(leaf) = leaf {
      if leaf.set_seam(face, on) {
        self.dirty.insert(key);
      }
    }
  }

  // ---------------------------------------------------------------------------
  // Edits
  // ---------------------------------------------------------------------------

  /// Apply world-space edits to every chunk they reach.
  ///
  /// Changed leaves are flagged and re-extracted on the next [`tick`].
  ///
  /// [`tick`]: Volume::tick
  #[tracing::instrument(skip_all, fields(volume = self.id.raw(), edits = edits.len()))]
  pub fn apply_edits(&mut self, edits: &[WorldEdit]) -> EditReport {
    let batch = EditPropagator::new(&self.config, &self.settings.edit_rules).propagate(edits, &self.chunks);
    let mut report = EditReport {
      rejected: batch.rejected,
      missing: batch.missing,
      ..EditReport::default()
    };

    for (coord, voxel_edits) in &batch.chunks {
      let Some(chunk) = self.chunks.get_mut(coord) else {
        continue;
      };
      match chunk.apply_voxel_edits(voxel_edits, &self.config, &mut self.pool) {
        Ok(Some(bounds)) => {
          report.chunks_changed += 1;
          report.leaves_flagged += chunk.validate_edits(&bounds, self.settings.edit_skirt).len();
        }
        Ok(None) => {}
        Err(err) => {
          tracing::warn!(chunk = %coord, %err, "edit batch failed");
          report.failed.push((*coord, err));
        }
      }
    }

    tracing::debug!(
      changed = report.chunks_changed,
      flagged = report.leaves_flagged,
      rejected = report.rejected,
      missing = report.missing.len(),
      "edits applied"
    );
    report
  }

  // ---------------------------------------------------------------------------
  // Output
  // ---------------------------------------------------------------------------

  /// Take every queued mesh update, oldest first.
  pub fn drain_mesh_updates(&mut self) -> Vec<MeshUpdate> {
    std::mem::take(&mut self.updates)
  }
}

impl<C: Chunk> ChunkLookup for Volume<C> {
  type Chunk = C;

  fn get_chunk_by_coord(&self, coord: IVec3) -> Option<&C> {
    self.chunks.get(&coord)
  }
}

fn has_leaves<C: Chunk>(chunk: &C) -> bool {
  !matches!(chunk.base().octree().state(), NodeState::Uninitialized)
}

// =============================================================================
// InitSteps
// =============================================================================

/// Iterator returned by [`Volume::init_steps`].
pub struct InitSteps<'a, C: Chunk> {
  volume: &'a mut Volume<C>,
}

impl<C: Chunk> Iterator for InitSteps<'_, C> {
  type Item = InitStep;

  fn next(&mut self) -> Option<InitStep> {
    self.volume.init_next()
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (0, Some(self.volume.pending_init.len()))
  }
}

#[cfg(test)]
#[path = "volume_test.rs"]
mod volume_test;
