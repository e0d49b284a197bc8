//! Mesh handles and the update queue consumed by a renderer.
//!
//! The core never touches GPU resources. Each rendered leaf owns a
//! [`MeshHandle`] taken from a [`MeshHandlePool`]; every change to what a
//! leaf shows is queued as a [`MeshUpdate`] for the host to drain.
//!
//! ```text
//!   leaf extracted ──► acquire(lod) ──► Upload { handle, .. }
//!   leaf disposed  ──► release(handle) ──► Release { handle }
//!                                            │
//!                          handle back in the free list of its LOD bucket
//! ```

use std::collections::HashMap;

use glam::IVec3;

use crate::types::MeshVertex;

// =============================================================================
// MeshHandle
// =============================================================================

/// Opaque id of one renderable leaf mesh.
///
/// Handles are recycled: a released id may come back for another leaf of the
/// same LOD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle {
  id: u32,
  bucket: u8,
}

impl MeshHandle {
  #[inline]
  pub fn id(&self) -> u32 {
    self.id
  }

  /// LOD bucket the handle was allocated for.
  #[inline]
  pub fn bucket(&self) -> u8 {
    self.bucket
  }
}

// =============================================================================
// MeshHandlePool
// =============================================================================

/// Handle allocator keyed by leaf LOD.
#[derive(Debug, Default)]
pub struct MeshHandlePool {
  free: HashMap<u8, Vec<MeshHandle>>,
  next_id: u32,
  live: usize,
}

impl MeshHandlePool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reuse a free handle of `bucket` or mint a new one.
  pub fn acquire(&mut self, bucket: u8) -> MeshHandle {
    self.live += 1;
    if let Some(handle) = self.free.get_mut(&bucket).and_then(Vec::pop) {
      return handle;
    }
    let handle = MeshHandle {
      id: self.next_id,
      bucket,
    };
    self.next_id += 1;
    handle
  }

  pub fn release(&mut self, handle: MeshHandle) {
    self.live = self.live.saturating_sub(1);
    self.free.entry(handle.bucket).or_default().push(handle);
  }

  /// Handles currently held by leaves.
  #[inline]
  pub fn live_count(&self) -> usize {
    self.live
  }

  /// Handles waiting in free lists.
  pub fn free_count(&self) -> usize {
    self.free.values().map(Vec::len).sum()
  }
}

// =============================================================================
// MeshUpdate
// =============================================================================

/// One change to the rendered scene.
#[derive(Clone, Debug)]
pub enum MeshUpdate {
  /// Create or replace the geometry behind `handle`.
  ///
  /// Vertex positions are chunk-local; place the mesh at the chunk's world
  /// origin.
  Upload {
    handle: MeshHandle,
    chunk: IVec3,
    lod: u8,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
  },
  /// Drop the geometry behind `handle`.
  Release { handle: MeshHandle },
}

impl MeshUpdate {
  pub fn handle(&self) -> MeshHandle {
    match self {
      MeshUpdate::Upload { handle, .. } | MeshUpdate::Release { handle } => *handle,
    }
  }
}

#[cfg(test)]
#[path = "presentation_test.rs"]
mod presentation_test;
