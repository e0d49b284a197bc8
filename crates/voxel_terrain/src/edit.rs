//! EditPropagator - world-space edits to per-chunk voxel edits.
//!
//! A global voxel near a chunk border lives in more than one chunk: its
//! primary chunk plus every neighbour whose padded range `[-1, cs + 1]`
//! covers it. Every owner receives the same resolved edit so skirts stay in
//! sync.
//!
//! ```text
//!   one axis, cs = 16         primary local   also owned by
//!   ──────────────────────────────────────────────────────────
//!                                  0          prev chunk as 16
//!                                  1          prev chunk as 17
//!                                 15          next chunk as -1
//! ```
//!
//! Current values are read from the primary chunk's sparse store, so
//! propagation never decompresses anything.

use std::collections::{HashMap, HashSet};

use glam::{IVec3, Vec3};

use crate::chunk::Chunk;
use crate::config::ChunkConfig;
use crate::error::TerrainError;
use crate::types::{MaterialId, VoxelData, VoxelEdit};

// =============================================================================
// Inputs
// =============================================================================

/// Region affected by a [`WorldEdit`], in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditShape {
  /// Delta falls off linearly from the centre to zero at `radius`.
  Sphere { center: Vec3, radius: f32 },
  /// Full delta for every voxel inside (inclusive).
  Box { min: Vec3, max: Vec3 },
}

/// A density change requested in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldEdit {
  pub shape: EditShape,
  /// Added to density; negative digs.
  pub density_delta: i32,
  /// Material written where the delta outweighs the current density.
  pub material: MaterialId,
}

impl WorldEdit {
  pub fn sphere(center: Vec3, radius: f32, density_delta: i32, material: MaterialId) -> Self {
    Self {
      shape: EditShape::Sphere { center, radius },
      density_delta,
      material,
    }
  }

  pub fn cuboid(min: Vec3, max: Vec3, density_delta: i32, material: MaterialId) -> Self {
    Self {
      shape: EditShape::Box { min, max },
      density_delta,
      material,
    }
  }
}

/// Edit policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditRules {
  non_diggable: HashSet<MaterialId>,
}

impl EditRules {
  pub fn new() -> Self {
    Self::default()
  }

  /// Removals never touch voxels of `material`.
  pub fn with_non_diggable(mut self, material: MaterialId) -> Self {
    self.non_diggable.insert(material);
    self
  }

  #[inline]
  pub fn is_diggable(&self, material: MaterialId) -> bool {
    !self.non_diggable.contains(&material)
  }
}

/// Chunk registry seen by edit propagation and seam broadcasts.
pub trait ChunkLookup {
  type Chunk: Chunk;

  fn get_chunk_by_coord(&self, coord: IVec3) -> Option<&Self::Chunk>;
}

impl<C: Chunk> ChunkLookup for HashMap<IVec3, C> {
  type Chunk = C;

  fn get_chunk_by_coord(&self, coord: IVec3) -> Option<&C> {
    self.get(&coord)
  }
}

// =============================================================================
// Output
// =============================================================================

/// Resolved edits grouped per chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditBatch {
  /// Per-chunk edits sorted by data index; chunks in z, y, x order.
  pub chunks: Vec<(IVec3, Vec<VoxelEdit>)>,
  /// Primary chunks that were absent or uninitialized.
  pub missing: Vec<IVec3>,
  /// Voxels dropped by pinning or the non-diggable rule.
  pub rejected: usize,
}

impl EditBatch {
  pub fn is_empty(&self) -> bool {
    self.chunks.is_empty()
  }

  pub fn edits_for(&self, chunk: IVec3) -> Option<&[VoxelEdit]> {
    self
      .chunks
      .iter()
      .find(|(coord, _)| *coord == chunk)
      .map(|(_, edits)| edits.as_slice())
  }
}

// =============================================================================
// EditPropagator
// =============================================================================

pub struct EditPropagator<'a> {
  config: &'a ChunkConfig,
  rules: &'a EditRules,
}

impl<'a> EditPropagator<'a> {
  pub fn new(config: &'a ChunkConfig, rules: &'a EditRules) -> Self {
    Self { config, rules }
  }

  /// Every chunk whose padded data range holds `global`, primary first.
  pub fn owning_chunks(&self, global: IVec3) -> Vec<IVec3> {
    let cs = self.config.chunk_size() as i32;
    let primary = self.config.chunk_of_voxel(global);
    let local = global - primary * cs;

    let mut per_axis: [Vec<i32>; 3] = Default::default();
    for axis in 0..3 {
      per_axis[axis].push(primary[axis]);
      if local[axis] <= 1 {
        per_axis[axis].push(primary[axis] - 1);
      }
      if local[axis] == cs - 1 {
        per_axis[axis].push(primary[axis] + 1);
      }
    }

    let mut owners = Vec::with_capacity(8);
    for &z in &per_axis[2] {
      for &y in &per_axis[1] {
        for &x in &per_axis[0] {
          owners.push(IVec3::new(x, y, z));
        }
      }
    }
    owners
  }

  /// Resolve `edits` against the chunks of `lookup`.
  ///
  /// Later edits in the slice see the results of earlier ones.
  pub fn propagate<L: ChunkLookup>(&self, edits: &[WorldEdit], lookup: &L) -> EditBatch {
    let mut pending: HashMap<IVec3, VoxelData> = HashMap::new();
    let mut per_chunk: HashMap<IVec3, HashMap<usize, VoxelEdit>> = HashMap::new();
    let mut missing: HashSet<IVec3> = HashSet::new();
    let mut rejected = 0;

    for edit in edits {
      for (global, delta) in self.voxel_deltas(edit) {
        let primary = self.config.chunk_of_voxel(global);
        let current = match pending.get(&global) {
          Some(voxel) => *voxel,
          None => {
            let local = global - self.config.chunk_origin(primary);
            match lookup
              .get_chunk_by_coord(primary)
              .and_then(|chunk| chunk.query_voxel(self.config, local))
            {
              Some(voxel) => voxel,
              None => {
                missing.insert(primary);
                continue;
              }
            }
          }
        };

        let owners: Vec<(IVec3, &L::Chunk)> = self
          .owning_chunks(global)
          .into_iter()
          .filter_map(|coord| lookup.get_chunk_by_coord(coord).map(|chunk| (coord, chunk)))
          .collect();

        let pinned = owners.iter().any(|(coord, chunk)| {
          chunk.is_pinned(global - self.config.chunk_origin(*coord))
        });
        if pinned || (delta < 0 && !self.rules.is_diggable(current.material)) {
          rejected += 1;
          continue;
        }

        let Some(next) = resolve(current, delta, edit.material) else {
          continue;
        };
        pending.insert(global, next);

        for (coord, _) in owners {
          let local = global - self.config.chunk_origin(coord);
          if let Some(index) = self.config.voxel_index(local) {
            per_chunk.entry(coord).or_default().insert(
              index,
              VoxelEdit {
                index,
                density: next.density,
                material: next.material,
              },
            );
          }
        }
      }
    }

    let mut chunks: Vec<(IVec3, Vec<VoxelEdit>)> = per_chunk
      .into_iter()
      .map(|(coord, edits)| {
        let mut edits: Vec<VoxelEdit> = edits.into_values().collect();
        edits.sort_unstable_by_key(|e| e.index);
        (coord, edits)
      })
      .collect();
    chunks.sort_unstable_by_key(|(c, _)| (c.z, c.y, c.x));

    let mut missing: Vec<IVec3> = missing.into_iter().collect();
    missing.sort_unstable_by_key(|c| (c.z, c.y, c.x));
    for coord in &missing {
      let err = TerrainError::MissingChunk(*coord);
      tracing::debug!(%err, "edit skipped");
    }

    EditBatch {
      chunks,
      missing,
      rejected,
    }
  }

  /// Global voxels touched by `edit` with their non-zero deltas.
  fn voxel_deltas(&self, edit: &WorldEdit) -> Vec<(IVec3, i32)> {
    let mut out = Vec::new();
    match edit.shape {
      EditShape::Sphere { center, radius } => {
        let center = self.config.world_to_voxel(center);
        let radius = radius / self.config.resolution();
        if radius <= 0.0 {
          return out;
        }
        let lo = (center - Vec3::splat(radius)).floor().as_ivec3();
        let hi = (center + Vec3::splat(radius)).ceil().as_ivec3();
        for_each_voxel(lo, hi, |p| {
          let distance = p.as_vec3().distance(center);
          if distance > radius {
            return;
          }
          let delta = (edit.density_delta as f32 * (1.0 - distance / radius)).round() as i32;
          if delta != 0 {
            out.push((p, delta));
          }
        });
      }
      EditShape::Box { min, max } => {
        let a = self.config.world_to_voxel(min);
        let b = self.config.world_to_voxel(max);
        let lo = a.min(b).ceil().as_ivec3();
        let hi = a.max(b).floor().as_ivec3();
        if edit.density_delta != 0 {
          for_each_voxel(lo, hi, |p| out.push((p, edit.density_delta)));
        }
      }
    }
    out
  }
}

fn for_each_voxel(lo: IVec3, hi: IVec3, mut f: impl FnMut(IVec3)) {
  for z in lo.z..=hi.z {
    for y in lo.y..=hi.y {
      for x in lo.x..=hi.x {
        f(IVec3::new(x, y, z));
      }
    }
  }
}

/// Apply a delta to one voxel. `None` when nothing changes.
///
/// The material is replaced only when the delta outweighs the current
/// density.
pub fn resolve(current: VoxelData, delta: i32, material: MaterialId) -> Option<VoxelData> {
  let density = (i32::from(current.density) + delta).clamp(0, 255) as u8;
  let material = if delta.unsigned_abs() > u32::from(current.density) {
    material
  } else {
    current.material
  };
  let next = VoxelData::new(density, material);
  (next != current).then_some(next)
}

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;
