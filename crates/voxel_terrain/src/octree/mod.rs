//! Octree module for per-chunk LOD subdivision.
//!
//! Every chunk owns one explicit octree. The root covers the chunk at the
//! coarsest LOD; nodes near the viewer split into eight children until the
//! distance bands of [`LodRanges`] are met.
//!
//! # LOD Convention
//!
//! LOD 0 = finest detail, higher LOD = coarser.
//!
//! ```text
//! Node Size = cubes_per_octree_leaf * 2^LOD   (voxels)
//! Root LOD  = levels_of_detail - 1             (node size = chunk size)
//! ```
//!
//! # Module Structure
//!
//! - [`node`]: `OctreeNode` state machine, leaf meshes, validation passes
//! - [`lod`]: `LodRanges` distance bands
//! - [`mask`]: `Face`, `TransitionMask` and the seam rule
//! - [`bounds`]: `VoxelBounds` integer AABB

pub mod bounds;
pub mod lod;
pub mod mask;
pub mod node;

// Re-exports
pub use bounds::VoxelBounds;
pub use lod::{node_diagonal, LodRanges, DEFAULT_LOD_SPACING, MIN_LOD_SPACING};
pub use mask::{seam_flags, Face, TransitionMask};
pub use node::{LeafData, LeafKey, LodChanges, LodContext, NodeState, OctreeNode};
