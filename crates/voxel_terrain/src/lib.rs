//! voxel_terrain - engine independent volumetric terrain core
//!
//! Density/material voxels stored as run-length encoded chunks, a per-chunk
//! LOD octree, and marching cubes extraction with transition cells that stitch
//! leaves of different LOD without cracks.
//!
//! # Features
//!
//! - **Sparse storage**: chunks rest as RLE runs and only decompress into a
//!   pooled dense buffer while they are meshed or edited
//! - **LOD octree**: distance bands pick each leaf's LOD; adjacent leaves
//!   never differ by more than one level
//! - **Transition seams**: per-face transition meshes, enabled by a six-bit
//!   mask toward finer neighbours
//! - **Edits**: world-space edits replicated into every chunk whose skirt
//!   holds the touched voxels
//! - **Jobs**: extraction fans out on rayon and is applied after one join
//!
//! # Example
//!
//! ```ignore
//! use glam::{IVec3, Vec3};
//! use voxel_terrain::{ChunkConfig, HeightPlaneSource, MeshUpdate, Volume};
//!
//! let config = ChunkConfig::new(32, 3)?;
//! let mut volume: Volume = Volume::new(config, HeightPlaneSource::new(12.5));
//! volume.add_chunks(IVec3::splat(-1), IVec3::splat(1));
//! volume.initialize_pending();
//!
//! volume.tick(Vec3::new(0.0, 20.0, 0.0));
//! for update in volume.drain_mesh_updates() {
//!   match update {
//!     MeshUpdate::Upload { handle, vertices, indices, .. } => { /* upload */ }
//!     MeshUpdate::Release { handle } => { /* free */ }
//!   }
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

pub use config::ChunkConfig;
pub use error::{ErrorKind, TerrainError, TerrainResult};
pub use types::{MaterialId, MeshOutput, MeshVertex, TransitionMeshOutput, VoxelData, VoxelEdit};

// RLE store, dense buffers and the bucket pool
pub mod storage;
pub use storage::{DenseBufferPool, DensityRange, SparseVoxelStore, VoxelBuffer, VoxelOverrides};

// Marching cubes lookup tables
pub mod tables;

// Regular and transition cell extraction
pub mod extraction;
pub use extraction::{extract_regular, extract_transition, ExtractionOutput, ExtractionTask};

// Per-chunk LOD octree
pub mod octree;
pub use octree::{Face, LeafKey, LodRanges, OctreeNode, TransitionMask, VoxelBounds};

pub mod chunk;
pub use chunk::{BaseChunk, Chunk};

pub mod edit;
pub use edit::{ChunkLookup, EditBatch, EditPropagator, EditRules, EditShape, WorldEdit};

// Batched work on the rayon pool
pub mod jobs;
pub use jobs::{JobBatch, JobCoordinator, JobId};

pub mod presentation;
pub use presentation::{MeshHandle, MeshHandlePool, MeshUpdate};

// Content production
pub mod samplers;
pub mod source;
pub use samplers::{HeightPlaneSource, SphereSource, UniformSource};
pub use source::{ContentSource, NoOverrides, OverrideSource, SealedBoundsOverrides};

pub mod volume;
pub use volume::{EditReport, InitStep, TickStats, Volume, VolumeId, VolumeSettings};

#[cfg(test)]
mod test_utils;
