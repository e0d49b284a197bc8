//! Error taxonomy for the terrain core.
//!
//! Every detected misuse is returned as a [`TerrainError`] and the offending
//! call becomes a no-op. Policy rejections (pinned voxels, non-diggable
//! materials) and degenerate triangles are not errors and never surface here.

use glam::IVec3;
use thiserror::Error;

/// Coarse classification of [`TerrainError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// The call conflicts with the current state (double init, double checkout).
  InvalidState,
  /// A required collaborator (chunk, source) is absent.
  MissingDependency,
  /// The arguments themselves are unusable.
  InvalidInput,
  /// A background job failed to produce its output.
  JobFailure,
}

/// Errors reported by the terrain core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerrainError {
  /// Attempted to initialize a sparse store that already holds runs.
  #[error("sparse voxel store is already populated")]
  StoreAlreadyPopulated,

  /// Attempted to read or unpack a sparse store that holds no runs.
  #[error("sparse voxel store is empty")]
  StoreEmpty,

  /// Attempted to initialize a chunk twice.
  #[error("chunk {0} is already initialized")]
  ChunkAlreadyInitialized(IVec3),

  /// Chunk data was requested before initialization.
  #[error("chunk {0} has not been initialized")]
  ChunkNotInitialized(IVec3),

  /// A dense buffer bucket is already checked out.
  #[error("dense buffer bucket {bucket} is already checked out by chunk {owner}")]
  BufferCheckedOut {
    /// Chunk size of the bucket.
    bucket: u32,
    /// Chunk currently holding the buffer.
    owner: IVec3,
  },

  /// A dense buffer lease was released while jobs still reference it.
  #[error("dense buffer bucket {bucket} is still referenced by outstanding jobs")]
  BufferStillShared {
    /// Chunk size of the bucket.
    bucket: u32,
  },

  /// A chunk coordinate has no registered chunk.
  #[error("no chunk registered at {0}")]
  MissingChunk(IVec3),

  /// Packing needs at least one voxel.
  #[error("cannot pack an empty voxel buffer")]
  EmptyBuffer,

  /// A buffer does not match the configured data volume.
  #[error("buffer holds {actual} voxels, expected {expected}")]
  BufferSizeMismatch {
    /// Configured data volume size.
    expected: usize,
    /// Actual buffer length.
    actual: usize,
  },

  /// Configuration values are inconsistent.
  #[error("invalid configuration: {0}")]
  InvalidConfig(String),

  /// A scheduled job panicked before producing output.
  #[error("job {0} panicked")]
  JobPanicked(u64),
}

impl TerrainError {
  /// Classify this error.
  pub fn kind(&self) -> ErrorKind {
    match self {
      TerrainError::StoreAlreadyPopulated
      | TerrainError::StoreEmpty
      | TerrainError::ChunkAlreadyInitialized(_)
      | TerrainError::ChunkNotInitialized(_)
      | TerrainError::BufferCheckedOut { .. }
      | TerrainError::BufferStillShared { .. } => ErrorKind::InvalidState,
      TerrainError::MissingChunk(_) => ErrorKind::MissingDependency,
      TerrainError::EmptyBuffer
      | TerrainError::BufferSizeMismatch { .. }
      | TerrainError::InvalidConfig(_) => ErrorKind::InvalidInput,
      TerrainError::JobPanicked(_) => ErrorKind::JobFailure,
    }
  }
}

/// Result alias used throughout the crate.
pub type TerrainResult<T> = Result<T, TerrainError>;
