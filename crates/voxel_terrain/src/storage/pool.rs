//! Size-bucketed pool of dense voxel buffers.
//!
//! Dense buffers are large (`(chunk_size + 3)³` voxels) so at most one chunk
//! per chunk-size bucket holds one at a time. A chunk checks out the bucket's
//! buffer, unpacks into it, shares it read-only with extraction jobs through
//! an `Arc`, and releases it when the jobs have joined:
//!
//! ```text
//!   checkout(owner) ──► DenseLease ──► jobs clone Arc ──► complete()
//!                                                            │
//!   bucket slot ◄── release(lease, store) [repack if dirty] ◄┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use glam::IVec3;

use super::{pack, SparseVoxelStore, VoxelBuffer};
use crate::config::ChunkConfig;
use crate::error::{TerrainError, TerrainResult};

/// Exclusive access to a bucket's dense buffer.
#[derive(Debug)]
pub struct DenseLease {
  bucket: u32,
  owner: IVec3,
  buffer: Arc<VoxelBuffer>,
  dirty: bool,
}

impl DenseLease {
  #[inline]
  pub fn bucket(&self) -> u32 {
    self.bucket
  }

  #[inline]
  pub fn owner(&self) -> IVec3 {
    self.owner
  }

  #[inline]
  pub fn buffer(&self) -> &VoxelBuffer {
    &self.buffer
  }

  /// Read-only handle for jobs.
  #[inline]
  pub fn shared(&self) -> Arc<VoxelBuffer> {
    Arc::clone(&self.buffer)
  }

  /// Mutable access; fails while jobs still hold the buffer.
  pub fn buffer_mut(&mut self) -> TerrainResult<&mut VoxelBuffer> {
    let bucket = self.bucket;
    Arc::get_mut(&mut self.buffer).ok_or(TerrainError::BufferStillShared { bucket })
  }

  /// Request a repack into the owner's store on release.
  #[inline]
  pub fn mark_dirty(&mut self) {
    self.dirty = true;
  }

  #[inline]
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  #[inline]
  pub fn is_shared(&self) -> bool {
    Arc::strong_count(&self.buffer) > 1
  }
}

#[derive(Debug, Default)]
struct BucketSlot {
  buffer: Option<Arc<VoxelBuffer>>,
  owner: Option<IVec3>,
}

/// Pool of dense buffers, one per chunk-size bucket.
#[derive(Debug, Default)]
pub struct DenseBufferPool {
  buckets: HashMap<u32, BucketSlot>,
}

impl DenseBufferPool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check out the buffer for `config`'s bucket on behalf of `owner`.
  ///
  /// The buffer contents are whatever the previous owner left; callers unpack
  /// before reading.
  pub fn checkout(&mut self, owner: IVec3, config: &ChunkConfig) -> TerrainResult<DenseLease> {
    let bucket = config.chunk_size();
    let slot = self.buckets.entry(bucket).or_default();
    if let Some(current) = slot.owner {
      return Err(TerrainError::BufferCheckedOut {
        bucket,
        owner: current,
      });
    }

    let buffer = match slot.buffer.take() {
      Some(buffer) if buffer.len() == config.data_volume_size() as usize => buffer,
      _ => Arc::new(VoxelBuffer::new(config)),
    };
    slot.owner = Some(owner);

    Ok(DenseLease {
      bucket,
      owner,
      buffer,
      dirty: false,
    })
  }

  /// Return a lease, repacking into `store` when it is dirty.
  ///
  /// Returns whether a repack happened. A lease still shared with jobs is
  /// handed back untouched alongside the error.
  pub fn release(
    &mut self,
    lease: DenseLease,
    store: &mut SparseVoxelStore,
    config: &ChunkConfig,
  ) -> Result<bool, (TerrainError, DenseLease)> {
    if lease.is_shared() {
      let bucket = lease.bucket;
      return Err((TerrainError::BufferStillShared { bucket }, lease));
    }

    let repacked = if lease.dirty {
      match pack(lease.buffer.as_slice(), config.data_area_size() as usize) {
        Ok(runs) => {
          store.replace(runs);
          true
        }
        Err(err) => return Err((err, lease)),
      }
    } else {
      false
    };

    let slot = self.buckets.entry(lease.bucket).or_default();
    slot.owner = None;
    slot.buffer = Some(lease.buffer);
    Ok(repacked)
  }

  /// Current holder of a bucket, if any.
  pub fn checked_out_by(&self, bucket: u32) -> Option<IVec3> {
    self.buckets.get(&bucket).and_then(|slot| slot.owner)
  }

  /// Drop idle pooled buffers. Checked-out buckets are untouched.
  pub fn trim(&mut self) {
    self.buckets.retain(|_, slot| slot.owner.is_some());
  }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
